//! JOSM session (`.jos`) document assembly.
//!
//! The layout mirrors what JOSM's session importer expects: a `josm-session`
//! root with `viewport`, `projection` and `layers` children, one `geoimage`
//! layer per photo folder, then one `tracks` layer per GPS track file.

use crate::config::{AppConfig, TimeZonePolicy};
pub use crate::config::TrackIndexing;
use crate::convert::{encode_exif_time, format_decimal};
use crate::error::AppError;
use crate::metadata::{GeoTaggedRecord, Layer, TrackReference};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::{Path, PathBuf};

const SESSION_VERSION: &str = "0.1";
const LAYER_VERSION: &str = "0.1";
const PROJECTION_ID: &str = "core:mercator";
const PROJECTION_CODE: &str = "EPSG:3857";
const GEOIMAGE_LAYER: &str = "geoimage";
const TRACKS_LAYER: &str = "tracks";
const UPRIGHT_ORIENTATION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub track_indexing: TrackIndexing,
    pub time_zone: TimeZonePolicy,
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            track_indexing: config.track_indexing,
            time_zone: config.time_zone,
        }
    }
}

/// Result of persisting a session document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Written(PathBuf),
    /// The destination directory does not exist; nothing was written.
    DirectoryMissing(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionDocument {
    layers: Vec<Layer>,
    tracks: Vec<TrackReference>,
    options: SessionOptions,
}

pub fn image_layer_index(position: usize) -> usize {
    position
}

pub fn track_layer_index(image_layers: usize, position: usize, mode: TrackIndexing) -> usize {
    match mode {
        TrackIndexing::SkipOne => image_layers + 1 + position,
        TrackIndexing::Contiguous => image_layers + position,
    }
}

/// Replaces backslashes and the host separator with `/`.
pub fn normalize_separators(path: &str) -> String {
    path.chars()
        .map(|c| {
            if c == '\\' || c == std::path::MAIN_SEPARATOR {
                '/'
            } else {
                c
            }
        })
        .collect()
}

/// `file:` reference for a track layer, e.g. `file:/C:/gps/day1.gpx` or `file:/data/day1.gpx`.
pub fn track_file_uri(path: &Path) -> String {
    let normalized = normalize_separators(&path.to_string_lossy());
    if normalized.starts_with('/') {
        format!("file:{}", normalized)
    } else {
        format!("file:/{}", normalized)
    }
}

/// Builds a session from parallel lists of record sets and folder names.
pub fn build_session<S: AsRef<str>>(
    record_lists: Vec<Vec<GeoTaggedRecord>>,
    folder_names: &[S],
    track_paths: &[PathBuf],
    options: SessionOptions,
) -> Result<SessionDocument, AppError> {
    if record_lists.len() != folder_names.len() {
        return Err(AppError::LayerNameMismatch {
            layers: record_lists.len(),
            names: folder_names.len(),
        });
    }

    let layers = record_lists
        .into_iter()
        .zip(folder_names)
        .map(|(records, name)| Layer::from_folder(Path::new(name.as_ref()), records))
        .collect();
    let tracks = track_paths.iter().cloned().map(TrackReference::new).collect();

    Ok(SessionDocument::new(layers, tracks, options))
}

impl SessionDocument {
    pub fn new(layers: Vec<Layer>, tracks: Vec<TrackReference>, options: SessionOptions) -> Self {
        Self {
            layers,
            tracks,
            options,
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn tracks(&self) -> &[TrackReference] {
        &self.tracks
    }

    pub fn to_xml(&self) -> Result<String, AppError> {
        let mut buffer = Vec::new();
        self.write_xml(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    pub fn write_xml<W: Write>(&self, out: W) -> Result<(), AppError> {
        let mut writer = Writer::new(out);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("josm-session").with_attributes([("version", SESSION_VERSION)]),
        ))?;

        writer.write_event(Event::Empty(BytesStart::new("viewport")))?;

        writer.write_event(Event::Start(BytesStart::new("projection")))?;
        writer.write_event(Event::Start(BytesStart::new("projection-choice")))?;
        text_element(&mut writer, "id", PROJECTION_ID)?;
        writer.write_event(Event::End(BytesEnd::new("projection-choice")))?;
        text_element(&mut writer, "code", PROJECTION_CODE)?;
        writer.write_event(Event::End(BytesEnd::new("projection")))?;

        writer.write_event(Event::Start(BytesStart::new("layers")))?;
        for (position, layer) in self.layers.iter().enumerate() {
            self.write_image_layer(&mut writer, image_layer_index(position), layer)?;
        }
        for (position, track) in self.tracks.iter().enumerate() {
            let index =
                track_layer_index(self.layers.len(), position, self.options.track_indexing);
            write_track_layer(&mut writer, index, track)?;
        }
        writer.write_event(Event::End(BytesEnd::new("layers")))?;

        writer.write_event(Event::End(BytesEnd::new("josm-session")))?;
        Ok(())
    }

    /// Writes the document to `path`. A missing parent directory is reported, not raised.
    pub fn write_to(&self, path: &Path) -> Result<WriteStatus, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                log::warn!(
                    "The folder to write the session file doesn't exist: {:?}",
                    parent
                );
                return Ok(WriteStatus::DirectoryMissing(parent.to_path_buf()));
            }
        }

        let file = std::fs::File::create(path)?;
        let mut out = std::io::BufWriter::new(file);
        self.write_xml(&mut out)?;
        out.flush()?;

        log::info!("Session file written to {:?}", path);
        Ok(WriteStatus::Written(path.to_path_buf()))
    }

    fn write_image_layer<W: Write>(
        &self,
        writer: &mut Writer<W>,
        index: usize,
        layer: &Layer,
    ) -> Result<(), AppError> {
        let index = index.to_string();
        writer.write_event(Event::Start(BytesStart::new("layer").with_attributes([
            ("index", index.as_str()),
            ("name", layer.name.as_str()),
            ("type", GEOIMAGE_LAYER),
            ("version", LAYER_VERSION),
            ("visible", "true"),
        ])))?;
        text_element(writer, "show-thumbnails", "false")?;

        for record in &layer.records {
            self.write_geoimage(writer, record)?;
        }

        writer.write_event(Event::End(BytesEnd::new("layer")))?;
        Ok(())
    }

    fn write_geoimage<W: Write>(
        &self,
        writer: &mut Writer<W>,
        record: &GeoTaggedRecord,
    ) -> Result<(), AppError> {
        let latitude = format_decimal(record.latitude);
        let longitude = format_decimal(record.longitude);
        let elevation = record.elevation.map(format_decimal).unwrap_or_default();
        let bearing = record.bearing.map(format_decimal).unwrap_or_default();
        let exif_time = encode_exif_time(&record.timestamp, self.options.time_zone);

        writer.write_event(Event::Start(BytesStart::new("geoimage")))?;
        text_element(writer, "file", &record.path.to_string_lossy())?;
        text_element(writer, "thumbnail", "false")?;
        writer.write_event(Event::Empty(BytesStart::new("position").with_attributes([
            ("lat", latitude.as_str()),
            ("lon", longitude.as_str()),
        ])))?;
        text_element(writer, "elevation", &elevation)?;
        text_element(writer, "exif-orientation", UPRIGHT_ORIENTATION)?;
        text_element(writer, "exif-time", &exif_time)?;
        text_element(writer, "exif-image-direction", &bearing)?;
        text_element(writer, "is-new-gps-data", "false")?;
        writer.write_event(Event::End(BytesEnd::new("geoimage")))?;
        Ok(())
    }
}

fn write_track_layer<W: Write>(
    writer: &mut Writer<W>,
    index: usize,
    track: &TrackReference,
) -> Result<(), AppError> {
    let index = index.to_string();
    writer.write_event(Event::Start(BytesStart::new("layer").with_attributes([
        ("index", index.as_str()),
        ("name", track.name.as_str()),
        ("type", TRACKS_LAYER),
        ("version", LAYER_VERSION),
        ("visible", "true"),
    ])))?;
    text_element(writer, "file", &track_file_uri(&track.path))?;
    writer.write_event(Event::End(BytesEnd::new("layer")))?;
    Ok(())
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), AppError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(path: &str, second: u32, micros: u32) -> GeoTaggedRecord {
        GeoTaggedRecord {
            path: PathBuf::from(path),
            timestamp: NaiveDate::from_ymd_opt(2018, 7, 10)
                .unwrap()
                .and_hms_micro_opt(16, 47, second, micros)
                .unwrap(),
            longitude: -2.16,
            latitude: 47.7,
            elevation: Some(12.5),
            bearing: None,
        }
    }

    fn utc_options(track_indexing: TrackIndexing) -> SessionOptions {
        SessionOptions {
            track_indexing,
            time_zone: TimeZonePolicy::Utc,
        }
    }

    #[test]
    fn track_indices_skip_one_after_image_layers_by_default() {
        assert_eq!(track_layer_index(2, 0, TrackIndexing::SkipOne), 3);
        assert_eq!(track_layer_index(2, 1, TrackIndexing::SkipOne), 4);
        assert_eq!(track_layer_index(0, 0, TrackIndexing::SkipOne), 1);
    }

    #[test]
    fn contiguous_track_indices_follow_image_layers() {
        assert_eq!(track_layer_index(2, 0, TrackIndexing::Contiguous), 2);
        assert_eq!(track_layer_index(2, 1, TrackIndexing::Contiguous), 3);
    }

    #[test]
    fn separators_become_forward_slashes() {
        assert_eq!(normalize_separators(r"C:\gps\day1.gpx"), "C:/gps/day1.gpx");
        assert_eq!(
            normalize_separators("/data/gps/day1.gpx"),
            "/data/gps/day1.gpx"
        );
    }

    #[test]
    fn track_uri_has_a_single_scheme_prefix() {
        assert_eq!(
            track_file_uri(Path::new(r"C:\gps\day1.gpx")),
            "file:/C:/gps/day1.gpx"
        );
        assert_eq!(
            track_file_uri(Path::new("/data/gps/day1.gpx")),
            "file:/data/gps/day1.gpx"
        );
    }

    #[test]
    fn layer_names_must_match_layer_count() {
        let result = build_session(
            vec![vec![], vec![]],
            &["only-one"],
            &[],
            SessionOptions::default(),
        );
        assert!(matches!(
            result,
            Err(AppError::LayerNameMismatch { layers: 2, names: 1 })
        ));
    }

    #[test]
    fn document_has_fixed_header_and_projection() {
        let doc = SessionDocument::new(vec![], vec![], utc_options(TrackIndexing::SkipOne));
        let xml = doc.to_xml().unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<josm-session version="0.1"><viewport/>"#,
                "<projection><projection-choice><id>core:mercator</id></projection-choice>",
                "<code>EPSG:3857</code></projection><layers></layers></josm-session>"
            )
        );
    }

    #[test]
    fn geoimage_entry_encodes_every_field() {
        let layer = Layer::from_folder(
            Path::new("/photos/cam"),
            vec![record("/photos/cam/a.jpg", 19, 643_000)],
        );
        let doc = SessionDocument::new(vec![layer], vec![], utc_options(TrackIndexing::SkipOne));
        let xml = doc.to_xml().unwrap();

        assert!(xml.contains(concat!(
            r#"<layer index="0" name="cam" type="geoimage" version="0.1" visible="true">"#,
            "<show-thumbnails>false</show-thumbnails>"
        )));
        assert!(xml.contains(concat!(
            "<geoimage><file>/photos/cam/a.jpg</file><thumbnail>false</thumbnail>",
            r#"<position lat="47.7" lon="-2.16"/>"#,
            "<elevation>12.5</elevation><exif-orientation>1</exif-orientation>",
            "<exif-time>1531241239643</exif-time><exif-image-direction></exif-image-direction>",
            "<is-new-gps-data>false</is-new-gps-data></geoimage>"
        )));
    }

    #[test]
    fn track_layers_come_after_image_layers() {
        let doc = build_session(
            vec![vec![record("a.jpg", 1, 0)], vec![record("b.jpg", 2, 0)]],
            &["/photos/front", "/photos/back"],
            &[PathBuf::from("/data/day1.gpx")],
            utc_options(TrackIndexing::SkipOne),
        )
        .unwrap();
        let xml = doc.to_xml().unwrap();

        assert!(xml.contains(r#"<layer index="0" name="front""#));
        assert!(xml.contains(r#"<layer index="1" name="back""#));
        assert!(xml.contains(concat!(
            r#"<layer index="3" name="day1.gpx" type="tracks" version="0.1" visible="true">"#,
            "<file>file:/data/day1.gpx</file></layer>"
        )));
        let back = xml.find("name=\"back\"").unwrap();
        assert!(back < xml.find("name=\"day1.gpx\"").unwrap());
    }

    #[test]
    fn contiguous_mode_uses_the_next_index() {
        let doc = build_session(
            vec![vec![], vec![]],
            &["front", "back"],
            &[PathBuf::from("day1.gpx")],
            utc_options(TrackIndexing::Contiguous),
        )
        .unwrap();
        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(r#"<layer index="2" name="day1.gpx""#));
    }

    #[test]
    fn text_is_escaped() {
        let layer = Layer::from_folder(Path::new("R&D"), vec![record("R&D/<a>.jpg", 1, 0)]);
        let doc = SessionDocument::new(vec![layer], vec![], utc_options(TrackIndexing::SkipOne));
        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(r#"name="R&amp;D""#));
        assert!(xml.contains("<file>R&amp;D/&lt;a&gt;.jpg</file>"));
    }

    #[test]
    fn building_twice_gives_identical_bytes() {
        let build = || {
            build_session(
                vec![vec![record("b.jpg", 2, 70_000), record("a.jpg", 1, 0)]],
                &["cam"],
                &[PathBuf::from("t.gpx")],
                utc_options(TrackIndexing::SkipOne),
            )
            .unwrap()
            .to_xml()
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn write_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("session.jos");
        let doc = SessionDocument::new(vec![], vec![], SessionOptions::default());

        let status = doc.write_to(&target).unwrap();
        assert_eq!(
            status,
            WriteStatus::DirectoryMissing(dir.path().join("missing"))
        );
        assert!(!target.exists());
        assert!(doc.to_xml().is_ok());
    }

    #[test]
    fn write_persists_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("session.jos");
        let doc = SessionDocument::new(vec![], vec![], SessionOptions::default());

        let status = doc.write_to(&target).unwrap();
        assert_eq!(status, WriteStatus::Written(target.clone()));
        let written = std::fs::read_to_string(&target).unwrap();
        assert_eq!(written, doc.to_xml().unwrap());
    }
}
