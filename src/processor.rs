use crate::config::{AppConfig, ParseErrorPolicy};
use crate::convert::{dms_to_decimal, parse_capture_time, parse_sub_second, rational_to_f64};
use crate::error::AppError;
use crate::metadata::{Extraction, GeoTaggedRecord, Layer};
use crate::walker;
use chrono::{NaiveDateTime, Timelike};
use exif::{Exif, In, Reader, Tag, Value};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Scans every folder in order, one layer per folder.
pub fn scan_folders(folders: &[PathBuf], config: &AppConfig) -> Result<Vec<Layer>, AppError> {
    let mut layers = Vec::with_capacity(folders.len());
    for folder in folders {
        let layer = scan_folder(folder, config)?;
        if layer.records.is_empty() && config.skip_empty_layers {
            log::info!("Skipping folder without geotagged images: {:?}", folder);
            continue;
        }
        layers.push(layer);
    }
    Ok(layers)
}

/// Reads the images below `folder` and returns them as a layer sorted by capture time.
pub fn scan_folder(folder: &Path, config: &AppConfig) -> Result<Layer, AppError> {
    let paths = walker::find_files(folder, &config.image_extensions);
    log::info!("Processing {} images in {:?}", paths.len(), folder);

    // Indexed collect keeps walk order, so the stable sort below sees files in name order.
    let outcomes: Vec<(PathBuf, Result<Extraction, AppError>)> = paths
        .into_par_iter()
        .map(|path| {
            let outcome = extract_record(&path);
            (path, outcome)
        })
        .collect();

    let mut records = Vec::new();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(Extraction::Record(record)) => {
                log::trace!("Extracted record for {:?}: {:?}", path, record);
                records.push(record);
            }
            Ok(Extraction::Insufficient) => {
                log::debug!("No position or capture time in {:?}", path);
            }
            Err(e) => match config.parse_error_policy {
                ParseErrorPolicy::Skip => {
                    log::warn!("Failed to process image {:?}: {}", path, e);
                }
                ParseErrorPolicy::Abort => return Err(e),
            },
        }
    }

    let layer = Layer::from_folder(folder, records);
    log::info!(
        "Folder {:?} gave {} geotagged images",
        layer.name,
        layer.records.len()
    );
    Ok(layer)
}

/// Reads the EXIF block of one image without decoding its pixels.
pub fn extract_record(path: &Path) -> Result<Extraction, AppError> {
    log::trace!("Extracting EXIF data for image: {:?}", path);
    let exif = {
        let file = File::open(path)?;
        let mut buf_reader = BufReader::new(file);
        match Reader::new().read_from_container(&mut buf_reader) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found for {:?}", path);
                return Ok(Extraction::Insufficient);
            }
            Err(e) => return Err(e.into()),
        }
    };
    record_from_exif(path, &exif)
}

fn record_from_exif(path: &Path, exif: &Exif) -> Result<Extraction, AppError> {
    let (Some(lat), Some(lon), Some(taken)) = (
        exif.get_field(Tag::GPSLatitude, In::PRIMARY),
        exif.get_field(Tag::GPSLongitude, In::PRIMARY),
        exif.get_field(Tag::DateTimeOriginal, In::PRIMARY),
    ) else {
        return Ok(Extraction::Insufficient);
    };

    let latitude = coordinate(
        Tag::GPSLatitude,
        &lat.value,
        ascii_tag(exif, Tag::GPSLatitudeRef)?,
    )?;
    let longitude = coordinate(
        Tag::GPSLongitude,
        &lon.value,
        ascii_tag(exif, Tag::GPSLongitudeRef)?,
    )?;
    let timestamp = capture_time(
        ascii(Tag::DateTimeOriginal, &taken.value)?,
        ascii_tag(exif, Tag::SubSecTimeOriginal)?,
    )?;

    let elevation = optional_rational(exif, Tag::GPSAltitude)?;
    let bearing = optional_rational(exif, Tag::GPSImgDirection)?;

    Ok(Extraction::Record(GeoTaggedRecord {
        path: path.to_path_buf(),
        timestamp,
        longitude,
        latitude,
        elevation,
        bearing,
    }))
}

fn coordinate(tag: Tag, value: &Value, hemisphere: Option<&str>) -> Result<f64, AppError> {
    let parts = rationals(tag, value)?;
    if parts.len() < 3 {
        return Err(AppError::malformed_tag(
            tag,
            format!(
                "expected degrees, minutes and seconds, got {} values",
                parts.len()
            ),
        ));
    }
    Ok(dms_to_decimal(
        parts[0],
        parts[1],
        parts[2],
        hemisphere.unwrap_or_default(),
    ))
}

fn capture_time(raw: &str, sub_second: Option<&str>) -> Result<NaiveDateTime, AppError> {
    let timestamp = parse_capture_time(raw)?;
    let Some(sub_second) = sub_second else {
        return Ok(timestamp);
    };
    let micros = parse_sub_second(sub_second)?;
    timestamp
        .with_nanosecond(micros * 1000)
        .ok_or_else(|| AppError::InvalidSubSecond(sub_second.to_string()))
}

fn optional_rational(exif: &Exif, tag: Tag) -> Result<Option<f64>, AppError> {
    let Some(field) = exif.get_field(tag, In::PRIMARY) else {
        return Ok(None);
    };
    let first = rationals(tag, &field.value)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::malformed_tag(tag, "no value"))?;
    Ok(Some(first))
}

fn rationals(tag: Tag, value: &Value) -> Result<Vec<f64>, AppError> {
    match value {
        Value::Rational(values) => values
            .iter()
            .map(|r| rational_to_f64(r.num, r.denom))
            .collect(),
        other => Err(AppError::malformed_tag(
            tag,
            format!("expected rational values, got {:?}", other),
        )),
    }
}

fn ascii_tag(exif: &Exif, tag: Tag) -> Result<Option<&str>, AppError> {
    exif.get_field(tag, In::PRIMARY)
        .map(|field| ascii(tag, &field.value))
        .transpose()
}

fn ascii(tag: Tag, value: &Value) -> Result<&str, AppError> {
    match value {
        Value::Ascii(strings) => {
            let bytes = strings.first().map(Vec::as_slice).unwrap_or_default();
            std::str::from_utf8(bytes)
                .map_err(|e| AppError::malformed_tag(tag, e.to_string()))
        }
        other => Err(AppError::malformed_tag(
            tag,
            format!("expected ASCII text, got {:?}", other),
        )),
    }
}
