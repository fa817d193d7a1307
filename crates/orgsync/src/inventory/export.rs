use std::io::Write;
use std::path::Path;

use super::{ContainerImage, InventoryError};

/// Writes the images as CSV with a header row.
pub fn write_csv(path: &Path, images: &[ContainerImage]) -> Result<(), InventoryError> {
    let file = std::fs::File::create(path).map_err(|e| InventoryError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_records(file, images)?;
    log::info!("Wrote {} images to {}", images.len(), path.display());
    Ok(())
}

pub fn write_records<W: Write>(writer: W, images: &[ContainerImage]) -> Result<(), InventoryError> {
    let mut writer = csv::Writer::from_writer(writer);
    for image in images {
        writer.serialize(image)?;
    }
    writer.flush().map_err(|e| InventoryError::Csv(e.into()))?;
    Ok(())
}
