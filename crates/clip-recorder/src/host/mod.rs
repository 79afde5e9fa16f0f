pub(crate) mod cpal_devices;
pub(crate) mod wav;

pub(crate) use {cpal_devices::CpalDevices, wav::WAV_MIME_TYPE};
