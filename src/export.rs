// src/export.rs - Snapshot export of world coordinates
use csv::{Terminator, WriterBuilder};
use ndarray_npy::write_npy;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::landmarks::Hand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// No hands were detected, nothing was written.
    NoData,
    /// Files written, in order.
    Written(Vec<PathBuf>),
}

impl Snapshot {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Snapshot::NoData => &[],
            Snapshot::Written(paths) => paths,
        }
    }
}

pub struct SnapshotExporter {
    output_dir: PathBuf,
}

impl SnapshotExporter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Writes an `.npy` array and a `.txt` table per hand, overwriting earlier snapshots of the
    /// same slot.
    pub fn export(&self, hands: &[Hand]) -> Result<Snapshot> {
        if hands.is_empty() {
            return Ok(Snapshot::NoData);
        }

        std::fs::create_dir_all(&self.output_dir)?;

        let mut written = Vec::with_capacity(hands.len() * 2);
        for hand in hands {
            let stem = format!("hand_{}_world_coordinates", hand.slot);

            let npy_path = self.output_dir.join(format!("{stem}.npy"));
            write_npy(&npy_path, &hand.to_array())?;
            info!("Saved world coordinates to {}", npy_path.display());
            written.push(npy_path);

            let txt_path = self.output_dir.join(format!("{stem}.txt"));
            self.write_table(&txt_path, hand)?;
            info!("Saved world coordinates to {}", txt_path.display());
            written.push(txt_path);
        }

        Ok(Snapshot::Written(written))
    }

    fn write_table(&self, path: &Path, hand: &Hand) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_path(path)?;

        writer.write_record(["Landmark", "X(m)", "Y(m)", "Z(m)"])?;
        for (i, joint) in hand.joints.iter().enumerate() {
            writer.write_record([
                i.to_string(),
                format!("{:.6}", joint.x),
                format!("{:.6}", joint.y),
                format!("{:.6}", joint.z),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::JOINT_COUNT;
    use ndarray::Array2;
    use ndarray_npy::read_npy;

    fn sample_rows(seed: f64) -> Vec<[f64; 3]> {
        (0..JOINT_COUNT)
            .map(|i| {
                let i = i as f64;
                [seed + i * 0.0031, 0.0 - 0.0123456789 * i, 0.000042 * i - seed]
            })
            .collect()
    }

    #[test]
    fn empty_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SnapshotExporter::new(dir.path());

        let snapshot = exporter.export(&[]).unwrap();

        assert_eq!(snapshot, Snapshot::NoData);
        assert!(snapshot.paths().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn writes_table_with_six_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SnapshotExporter::new(dir.path());
        let hand = Hand::from_rows(0, &sample_rows(0.0123));

        exporter.export(&[hand.clone()]).unwrap();

        let text =
            std::fs::read_to_string(dir.path().join("hand_0_world_coordinates.txt")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), JOINT_COUNT + 1);
        assert_eq!(lines[0], "Landmark,X(m),Y(m),Z(m)");

        let wrist = hand.joints[0];
        assert_eq!(
            lines[1],
            format!("0,{:.6},{:.6},{:.6}", wrist.x, wrist.y, wrist.z)
        );
        assert_eq!(lines[1], "0,0.012300,0.000000,-0.012300");
        assert!(lines[2].starts_with("1,0.015400,-0.012346,"));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn array_file_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SnapshotExporter::new(dir.path());
        let hand = Hand::from_rows(0, &sample_rows(0.5));

        exporter.export(&[hand.clone()]).unwrap();

        let loaded: Array2<f64> = read_npy(dir.path().join("hand_0_world_coordinates.npy")).unwrap();
        assert_eq!(loaded.shape(), &[JOINT_COUNT, 3]);
        assert_eq!(loaded, hand.to_array());
    }

    #[test]
    fn files_are_keyed_by_slot_and_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SnapshotExporter::new(dir.path());
        let hands = [
            Hand::from_rows(0, &sample_rows(0.1)),
            Hand::from_rows(1, &sample_rows(0.2)),
        ];

        let first = exporter.export(&hands).unwrap();
        let names: Vec<String> = first
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "hand_0_world_coordinates.npy",
                "hand_0_world_coordinates.txt",
                "hand_1_world_coordinates.npy",
                "hand_1_world_coordinates.txt",
            ]
        );

        let replacement = Hand::from_rows(0, &sample_rows(0.9));
        exporter.export(&[replacement.clone()]).unwrap();

        let loaded: Array2<f64> = read_npy(dir.path().join("hand_0_world_coordinates.npy")).unwrap();
        assert_eq!(loaded, replacement.to_array());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }
}
