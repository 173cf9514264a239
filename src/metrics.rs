use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

lazy_static::lazy_static! {
    pub static ref OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "vecdex_operations_total", "Engine operations", &["operation", "status"]
    ).unwrap();
    pub static ref VECTORS_ADDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "vecdex_vectors_added_total", "Vectors added", &["index"]
    ).unwrap();
    pub static ref SEARCH_DURATION: HistogramVec = register_histogram_vec!(
        "vecdex_search_duration_seconds", "Search duration", &["index"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();
    pub static ref PERSIST_DURATION: HistogramVec = register_histogram_vec!(
        "vecdex_persist_duration_seconds", "Durable write duration", &["index"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();
    pub static ref INDEXES_REGISTERED: IntGauge = register_int_gauge!(
        "vecdex_indexes_registered", "Indexes currently registered"
    ).unwrap();
}

pub fn init() {
    lazy_static::initialize(&OPERATIONS_TOTAL);
    lazy_static::initialize(&VECTORS_ADDED_TOTAL);
    lazy_static::initialize(&SEARCH_DURATION);
    lazy_static::initialize(&PERSIST_DURATION);
    lazy_static::initialize(&INDEXES_REGISTERED);
}

/// Count one engine operation by outcome.
pub fn record_operation<T, E>(operation: &str, result: &Result<T, E>) {
    let status = if result.is_ok() { "ok" } else { "error" };
    OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}
