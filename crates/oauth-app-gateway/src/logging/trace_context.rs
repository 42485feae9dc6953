//! Trace context - request correlation
//!
//! Generates short trace ids and the span every request is logged in.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, info_span, Span};

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Short trace id, 6 hex characters (e.g. "a1b2c3")
pub fn generate_trace_id() -> String {
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0);

    let mixed = counter.wrapping_add(timestamp);
    format!("{:06x}", mixed & 0xFFFFFF)
}

/// Correlation data of one request
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
    pub method: String,
    /// Path without the query string; query values may carry OAuth codes
    pub path: String,
    /// Route the OAuth router matched, e.g. `PATCH /token`
    pub route: Option<String>,
    pub started_at: Instant,
}

impl TraceContext {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            trace_id: generate_trace_id(),
            method: method.to_string(),
            path: path.to_string(),
            route: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_route(mut self, route: Option<String>) -> Self {
        self.route = route;
        self
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

pub struct RequestSpan;

impl RequestSpan {
    /// Span carrying the trace id into every log line of the request
    pub fn enter(ctx: &TraceContext) -> Span {
        info_span!(
            "request",
            trace_id = %ctx.trace_id,
            method = %ctx.method,
            path = %ctx.path,
        )
    }

    pub fn log_entry(ctx: &TraceContext) {
        match &ctx.route {
            Some(route) => info!(
                trace_id = %ctx.trace_id,
                "→ {} {} ({})",
                ctx.method,
                ctx.path,
                route
            ),
            None => info!(trace_id = %ctx.trace_id, "→ {} {}", ctx.method, ctx.path),
        }
    }

    pub fn log_exit(ctx: &TraceContext, status: u16) {
        info!(
            trace_id = %ctx.trace_id,
            "← {} ({}ms)",
            status,
            ctx.elapsed_ms()
        );
    }
}
