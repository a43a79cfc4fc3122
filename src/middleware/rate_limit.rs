use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

// Fixed one-second window. Coarse, but generation requests are expensive
// enough that burst smoothing is all that is needed here.
#[derive(Debug)]
struct Window {
    started: Instant,
    served: u32,
}

#[derive(Clone, Debug)]
pub struct RequestGate {
    per_second: u32,
    window: Arc<Mutex<Window>>,
}

impl RequestGate {
    fn new(per_second: u32) -> Self {
        Self {
            per_second: per_second.max(1),
            window: Arc::new(Mutex::new(Window {
                started: Instant::now(),
                served: 0,
            })),
        }
    }

    fn try_acquire(&self) -> bool {
        let mut window = self.window.lock().expect("request gate mutex poisoned");
        let now = Instant::now();
        if now.duration_since(window.started) >= Duration::from_secs(1) {
            window.started = now;
            window.served = 0;
        }
        if window.served < self.per_second {
            window.served += 1;
            true
        } else {
            false
        }
    }
}

pub async fn rps_middleware(
    State(gate): State<RequestGate>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !gate.try_acquire() {
        let body = Json(json!({ "error": "rate limit exceeded" }));
        return (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(per_second: u32) -> RequestGate {
    RequestGate::new(per_second)
}
