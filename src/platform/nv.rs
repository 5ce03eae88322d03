use crate::config::session::{DeviceDescriptor, ParentInfo};

/// Persistent storage of the network membership
///
/// Used to restore a device after a reboot without scanning again.
pub trait NvStore {
    /// Storage error
    type Error;

    /// Read the stored membership, if any
    fn load_network(&mut self) -> Result<Option<(DeviceDescriptor, ParentInfo)>, Self::Error>;

    /// Persist the current membership
    fn store_network(
        &mut self,
        device: &DeviceDescriptor,
        parent: &ParentInfo,
    ) -> Result<(), Self::Error>;

    /// Erase the stored membership
    fn clear_network(&mut self) -> Result<(), Self::Error>;
}
