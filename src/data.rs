//! Raw dataset types, one group per template.
//!
//! Datasets are plain records keyed by caller-chosen `usize` identifiers, so
//! the external search harness can ship them as JSON. Nothing is validated
//! here: required-key and domain checks happen when a template turns a
//! dataset into its sets and parameters, and any violation fails the build
//! with a schema error naming the offending parameter and key.

use serde::{Deserialize, Serialize};

/// Job-shop scheduling instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsspData {
    /// Job identifiers.
    pub jobs: Vec<usize>,
    /// Machine identifiers.
    pub machines: Vec<usize>,
    /// One entry per (job, machine). A job's machine order is the order of
    /// its entries in this list; every job must cover every machine exactly
    /// once.
    pub operations: Vec<OperationData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationData {
    pub job: usize,
    pub machine: usize,
    /// Processing time, strictly positive.
    pub duration: f64,
}

/// Traveling salesman instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TspData {
    /// Node identifiers.
    pub nodes: Vec<usize>,
    /// The tour's fixed starting node. Must be one of `nodes`.
    pub depot: usize,
    /// One cost per ordered pair of distinct nodes.
    pub costs: Vec<ArcCostData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcCostData {
    pub from: usize,
    pub to: usize,
    /// Travel cost, non-negative.
    pub cost: f64,
}

/// Capacitated warehouse location instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CwlpData {
    pub customers: Vec<CustomerData>,
    pub warehouses: Vec<WarehouseData>,
    /// One unit shipping cost per (customer, warehouse).
    pub supply_costs: Vec<SupplyCostData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerData {
    pub id: usize,
    /// Demand to be covered, non-negative.
    pub demand: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseData {
    pub id: usize,
    /// Outgoing flow capacity when opened, non-negative.
    pub capacity: f64,
    /// Cost of opening the warehouse, non-negative.
    pub fixed_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyCostData {
    pub customer: usize,
    pub warehouse: usize,
    /// Unit cost of serving the customer from the warehouse, non-negative.
    pub cost: f64,
}

/// Multi-commodity network design instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McndData {
    /// Commodity identifiers.
    pub commodities: Vec<usize>,
    /// Design arcs with their capacity and opening cost. No self-loops, no
    /// duplicates.
    pub arcs: Vec<DesignArcData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignArcData {
    pub from: usize,
    pub to: usize,
    /// Capacity available once the arc is opened, non-negative.
    pub capacity: f64,
    /// Cost of opening the arc, non-negative.
    pub cost: f64,
}

/// Pickup-and-delivery with time windows instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdptwData {
    pub nodes: Vec<PdptwNodeData>,
    pub arcs: Vec<TravelTimeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdptwNodeData {
    pub id: usize,
    /// Signed demand: positive for pickups, negative for deliveries.
    pub demand: f64,
    /// Earliest service start.
    pub tw_earliest: f64,
    /// Latest service start; must be at least `tw_earliest`.
    pub tw_latest: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelTimeData {
    pub from: usize,
    pub to: usize,
    /// Travel time, non-negative.
    pub time: f64,
}

/// Generic weighted covering instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveringData {
    /// Covering row identifiers.
    pub rows: Vec<usize>,
    pub columns: Vec<ColumnData>,
    /// Sparse row/column weights; unmentioned pairs weigh 0.
    pub weights: Vec<WeightData>,
    /// Sparse row thresholds; unmentioned rows require 0.
    pub thresholds: Vec<ThresholdData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnData {
    pub id: usize,
    /// Selection cost, non-negative.
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightData {
    pub row: usize,
    pub column: usize,
    /// Contribution of the column towards the row's threshold, non-negative.
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdData {
    pub row: usize,
    /// Required covering level, non-negative.
    pub threshold: f64,
}
