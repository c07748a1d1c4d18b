//! Completed work sessions and their visual markers

use serde::{Deserialize, Serialize};

/// Offsets of a marker inside the presentation's marker area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerPosition {
    pub top: f64,
    pub left: f64,
}

/// One completed work phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMarker {
    pub index: usize,
    /// Set by the presentation layer once it has placed or dragged the marker
    pub position: Option<MarkerPosition>,
}

/// Count of completed sessions plus one marker per session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub completed: u32,
    pub markers: Vec<SessionMarker>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted values.
    ///
    /// Positions beyond the completed count are dropped and missing ones
    /// become unplaced markers, so the two always line up.
    pub fn restore(completed: u32, positions: Vec<Option<MarkerPosition>>) -> Self {
        let mut positions = positions.into_iter();
        let markers = (0..completed as usize)
            .map(|index| SessionMarker {
                index,
                position: positions.next().flatten(),
            })
            .collect();

        Self { completed, markers }
    }

    /// Record one completed session and return its marker
    pub fn record_completion(&mut self) -> SessionMarker {
        let marker = SessionMarker {
            index: self.markers.len(),
            position: None,
        };
        self.completed = self.completed.saturating_add(1);
        self.markers.push(marker.clone());
        marker
    }

    /// Move a marker; `None` if there is no marker at that index
    pub fn place_marker(&mut self, index: usize, position: MarkerPosition) -> Option<&SessionMarker> {
        let marker = self.markers.get_mut(index)?;
        marker.position = Some(position);
        Some(marker)
    }

    /// Positions in marker order, for persistence
    pub fn positions(&self) -> Vec<Option<MarkerPosition>> {
        self.markers.iter().map(|m| m.position).collect()
    }

    pub fn clear(&mut self) {
        self.completed = 0;
        self.markers.clear();
    }
}
