//! Robot behaviors built on the command contract.

pub mod move_integral;
pub mod move_unjam;
pub mod tank_drive;
pub mod unjam_integral;

pub use move_integral::{MoveIntegralCommand, MoveIntegralConfig};
pub use move_unjam::{move_unjam_comprised_command, JamSwitchPolicy, MoveUnjamComprisedCommand};
pub use tank_drive::{TankDriveCommand, MAX_CHASSIS_SPEED_MPS};
pub use unjam_integral::{UnjamIntegralCommand, UnjamIntegralConfig};
