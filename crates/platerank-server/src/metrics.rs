use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Histogram,
    HistogramVec, IntCounterVec,
};

pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("platerank_requests_total", "Requests by op", &["op"]).unwrap()
});

pub static REQUEST_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "platerank_request_errors_total",
        "Rejected requests by op",
        &["op"]
    )
    .unwrap()
});

pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!("op_duration_seconds", "op durations", &["op"]).unwrap()
});

pub static RESULTS_RETURNED: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "recommend_results_returned",
        "Rows per recommendation response",
        vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .unwrap()
});
