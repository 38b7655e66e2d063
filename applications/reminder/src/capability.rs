/// Device class detection for the `auto` playback profile
use chime_core::DeviceClass;
use std::num::NonZeroUsize;

/// Machines with this many cores or fewer get the constrained preset
const CONSTRAINED_MAX_CORES: usize = 2;

/// Classify the current machine
pub fn detect_device_class() -> DeviceClass {
    let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let class = classify(cores);
    tracing::debug!(cores, ?class, "Detected device class");
    class
}

/// Classify by available parallelism
pub fn classify(cores: usize) -> DeviceClass {
    if cores <= CONSTRAINED_MAX_CORES {
        DeviceClass::Constrained
    } else {
        DeviceClass::Standard
    }
}
