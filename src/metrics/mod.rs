// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

use crate::utils::CircuitState;

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Employee roster uploads
// - Bulk order placement (outcome, latency, orders created)
// - Tracking email delivery and the mailer circuit breaker
//
// All metrics are registered with one registry, scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Roster Metrics
    pub employee_uploads: IntCounterVec,
    pub employees_uploaded: IntCounter,

    // Bulk Order Metrics
    pub bulk_orders: IntCounterVec,
    pub bulk_order_duration: Histogram,
    pub orders_created: IntCounter,

    // Notification Metrics
    pub notifications: IntCounterVec,
    pub mailer_circuit_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let employee_uploads = IntCounterVec::new(
            Opts::new("employee_uploads_total", "Employee roster uploads by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(employee_uploads.clone()))?;

        let employees_uploaded = IntCounter::new(
            "employees_uploaded_total",
            "Valid employee records stored from uploads",
        )?;
        registry.register(Box::new(employees_uploaded.clone()))?;

        let bulk_orders = IntCounterVec::new(
            Opts::new("bulk_orders_total", "Bulk order placements by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(bulk_orders.clone()))?;

        let bulk_order_duration = Histogram::with_opts(
            HistogramOpts::new("bulk_order_duration_seconds", "Bulk order placement duration")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(bulk_order_duration.clone()))?;

        let orders_created = IntCounter::new("orders_created_total", "Orders created by bulk placement")?;
        registry.register(Box::new(orders_created.clone()))?;

        let notifications = IntCounterVec::new(
            Opts::new("notifications_total", "Tracking emails by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        let mailer_circuit_state = IntGauge::new(
            "mailer_circuit_state",
            "Mailer circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(mailer_circuit_state.clone()))?;

        Ok(Self {
            registry,
            employee_uploads,
            employees_uploaded,
            bulk_orders,
            bulk_order_duration,
            orders_created,
            notifications,
            mailer_circuit_state,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_upload(&self, outcome: &str, employees: usize) {
        self.employee_uploads.with_label_values(&[outcome]).inc();
        self.employees_uploaded.inc_by(employees as u64);
    }

    pub fn record_bulk_order(&self, outcome: &str, duration_secs: f64) {
        self.bulk_orders.with_label_values(&[outcome]).inc();
        self.bulk_order_duration.observe(duration_secs);
    }

    pub fn record_orders_created(&self, orders: usize) {
        self.orders_created.inc_by(orders as u64);
    }

    pub fn record_notification(&self, outcome: &str) {
        self.notifications.with_label_values(&[outcome]).inc();
    }

    pub fn set_mailer_circuit_state(&self, state: CircuitState) {
        self.mailer_circuit_state.set(state.as_gauge());
    }
}
