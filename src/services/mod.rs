// Core services
pub mod alerts;
pub mod detector;
pub mod devices;
pub mod maintenance;
pub mod readings;
pub mod simulator;

pub use alerts::AlertService;
pub use detector::DetectorService;
pub use devices::DeviceService;
pub use maintenance::MaintenanceService;
pub use readings::ReadingService;
pub use simulator::SimulatorService;
