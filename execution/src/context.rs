use crate::fuel::FuelMeter;

/// Per-call execution context.
///
/// Owns the transaction-scoped fuel meter for the duration of one handler call
/// and borrows the block-scoped meter from the surrounding commit loop. Meters
/// travel through this context as explicit values, never as process-wide
/// state. The caller is responsible for serializing commit-path calls that
/// share one block meter.
pub struct ExecutionContext<'a> {
    fuel_meter: Box<dyn FuelMeter>,
    block_fuel_meter: &'a mut dyn FuelMeter,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(fuel_meter: Box<dyn FuelMeter>, block_fuel_meter: &'a mut dyn FuelMeter) -> Self {
        Self {
            fuel_meter,
            block_fuel_meter,
        }
    }

    /// The transaction-scoped meter. Its limit is expected to have been set by
    /// an earlier processing stage (fee handling).
    pub fn fuel_meter(&self) -> &dyn FuelMeter {
        self.fuel_meter.as_ref()
    }

    pub fn fuel_meter_mut(&mut self) -> &mut dyn FuelMeter {
        self.fuel_meter.as_mut()
    }

    /// The block-scoped meter, shared across all transactions in a block.
    pub fn block_fuel_meter(&self) -> &dyn FuelMeter {
        &*self.block_fuel_meter
    }

    pub fn block_fuel_meter_mut(&mut self) -> &mut dyn FuelMeter {
        &mut *self.block_fuel_meter
    }
}
