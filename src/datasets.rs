use std::fmt;
use std::path::{Path, PathBuf};

/// Whether a dataset refers to the published time series or to manual
/// field-visit readings. The portal exposes both as separate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// Published, quality-assured time series
    Ts,
    /// Spot readings taken during site visits
    Fv,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Ts => "TS",
            RecordType::Fv => "FV",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dataset/record-type pair to export for every bore.
///
/// `remote_name` is the portal-side series name; the full series identifier
/// sent to the portal is `<remote_name>@<bore>`. `unit_id` is the portal's
/// numeric unit code for the requested unit.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSpec {
    pub logical_name: &'static str,
    pub remote_name: &'static str,
    pub record_type: RecordType,
    pub unit_id: u32,
}

/// The fixed set of exports performed for every bore.
pub const DATASETS: [DatasetSpec; 4] = [
    DatasetSpec {
        logical_name: "DepthBelowGround",
        remote_name: "Depth_BGS.Publish",
        record_type: RecordType::Ts,
        unit_id: 82,
    },
    DatasetSpec {
        logical_name: "DepthBelowGround",
        remote_name: "Depth_BGS.Field_Visits",
        record_type: RecordType::Fv,
        unit_id: 82,
    },
    DatasetSpec {
        logical_name: "WaterElevation",
        remote_name: "Elev_AHD.Publish",
        record_type: RecordType::Ts,
        unit_id: 236,
    },
    DatasetSpec {
        logical_name: "WaterElevation",
        remote_name: "Elev_AHD.Field_Visits",
        record_type: RecordType::Fv,
        unit_id: 236,
    },
];

impl DatasetSpec {
    /// Per-dataset output directory name: `<remote_name>_<record_type>`
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.remote_name, self.record_type)
    }

    /// Output file name for one bore: `<bore>_<logical_name>_<record_type>.csv`
    pub fn file_name(&self, bore: &str) -> String {
        format!("{}_{}_{}.csv", bore, self.logical_name, self.record_type)
    }

    /// Full output path under `out_dir` for one bore.
    pub fn output_path(&self, out_dir: &Path, bore: &str) -> PathBuf {
        out_dir.join(self.dir_name()).join(self.file_name(bore))
    }
}
