//! `PoiCatalog` — name/edge lookup maps plus an R-tree for nearest queries.
//!
//! # CSV format
//!
//! One row per POI:
//!
//! ```csv
//! id,name,lat,lon,category,edge
//! poi_0,Cafe A,34.0689,-118.4452,cafe,edge_12
//! poi_1,Ralphs,34.0612,-118.4470,supermarket,edge_40
//! ```
//!
//! Names are the operator-facing identifiers; when two rows share a name the
//! later row wins the name lookup (the full list keeps both).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::Deserialize;

use rtc_core::{EdgeId, GeoPoint, PoiId};

use crate::{PoiError, PoiResult};

// ── Poi ───────────────────────────────────────────────────────────────────────

/// One catalog entry: a named destination with its nearest-edge binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: PoiId,
    pub name: String,
    pub pos: GeoPoint,
    /// Free-form category tag ("cafe", "office", …), used as the activity
    /// type of stops placed at this POI.
    pub category: String,
    /// The road edge this POI is reached from.
    pub edge: EdgeId,
}

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PoiRecord {
    id: String,
    name: String,
    lat: f64,
    lon: f64,
    category: String,
    edge: String,
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry in the spatial index: a `[lat, lon]` point with the POI's index
/// into the catalog vector.
#[derive(Debug)]
struct PoiEntry {
    point: [f64; 2],
    idx: usize,
}

impl RTreeObject for PoiEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for PoiEntry {
    /// Squared Euclidean distance in lat/lon space — sufficient for
    /// nearest-POI queries at city scale.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── PoiCatalog ────────────────────────────────────────────────────────────────

/// The read-only POI catalog.  Build once via [`PoiCatalog::load_csv`] (or
/// [`PoiCatalog::from_pois`] in tests) and share by reference.
#[derive(Debug)]
pub struct PoiCatalog {
    pois: Vec<Poi>,
    by_name: HashMap<String, usize>,
    by_edge: HashMap<EdgeId, Vec<usize>>,
    spatial_idx: RTree<PoiEntry>,
}

impl PoiCatalog {
    /// Load the catalog from a CSV file.
    pub fn load_csv(path: &Path) -> PoiResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::load_reader(file)
    }

    /// Like [`load_csv`][Self::load_csv] but accepts any `Read` source.
    /// Useful for testing (pass a `std::io::Cursor`).
    pub fn load_reader<R: Read>(reader: R) -> PoiResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut pois = Vec::new();

        for result in csv_reader.deserialize::<PoiRecord>() {
            let row = result.map_err(|e| PoiError::Parse(e.to_string()))?;
            pois.push(Poi {
                id: PoiId::new(row.id),
                name: row.name,
                pos: GeoPoint::new(row.lat, row.lon),
                category: row.category,
                edge: EdgeId::new(row.edge),
            });
        }

        Ok(Self::from_pois(pois))
    }

    /// Build a catalog from already-constructed entries.
    pub fn from_pois(pois: Vec<Poi>) -> Self {
        let mut by_name = HashMap::with_capacity(pois.len());
        let mut by_edge: HashMap<EdgeId, Vec<usize>> = HashMap::new();
        let mut entries = Vec::with_capacity(pois.len());

        for (idx, poi) in pois.iter().enumerate() {
            by_name.insert(poi.name.clone(), idx);
            by_edge.entry(poi.edge.clone()).or_default().push(idx);
            entries.push(PoiEntry { point: [poi.pos.lat, poi.pos.lon], idx });
        }

        Self {
            pois,
            by_name,
            by_edge,
            spatial_idx: RTree::bulk_load(entries),
        }
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// POI by display name.
    pub fn get(&self, name: &str) -> Option<&Poi> {
        self.by_name.get(name).map(|&i| &self.pois[i])
    }

    /// `true` if `name` is a known POI.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All POIs whose nearest edge is `edge`, in catalog order.
    pub fn on_edge(&self, edge: &EdgeId) -> Vec<&Poi> {
        self.by_edge
            .get(edge)
            .map(|idxs| idxs.iter().map(|&i| &self.pois[i]).collect())
            .unwrap_or_default()
    }

    /// The POI nearest to a geographic point, or `None` on an empty catalog.
    pub fn nearest(&self, point: GeoPoint) -> Option<&Poi> {
        self.spatial_idx
            .nearest_neighbor(&[point.lat, point.lon])
            .map(|entry| &self.pois[entry.idx])
    }

    /// All entries, in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Poi> {
        self.pois.iter()
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }
}
