//! Prometheus-compatible metrics and admin endpoint
//!
//! Counts registry activity and serves it, together with the match table,
//! over a minimal HTTP listener.
//! Default endpoint: http://localhost:9090/metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::registry::manager::{Registry, RegistryGauges};

/// Counters for registry activity
#[derive(Debug)]
pub struct RegistryMetrics {
    pub players_connected: AtomicU64,
    pub players_disconnected: AtomicU64,
    pub matches_created: AtomicU64,
    pub matches_joined: AtomicU64,
    pub matches_removed: AtomicU64,
    pub position_updates: AtomicU64,
    pub rejected_operations: AtomicU64,

    start_time: Instant,
}

impl RegistryMetrics {
    pub fn new() -> Self {
        Self {
            players_connected: AtomicU64::new(0),
            players_disconnected: AtomicU64::new(0),
            matches_created: AtomicU64::new(0),
            matches_joined: AtomicU64::new(0),
            matches_removed: AtomicU64::new(0),
            position_updates: AtomicU64::new(0),
            rejected_operations: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self, gauges: RegistryGauges) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("duel_registry_players", "Connected players", "gauge", gauges.players);
        metric!("duel_registry_matches_waiting", "Matches waiting for an opponent", "gauge",
            gauges.matches_waiting);
        metric!("duel_registry_matches_ready", "Matches with both slots filled", "gauge",
            gauges.matches_ready);

        metric!("duel_registry_players_connected_total", "Players registered", "counter",
            self.players_connected.load(Ordering::Relaxed));
        metric!("duel_registry_players_disconnected_total", "Players removed", "counter",
            self.players_disconnected.load(Ordering::Relaxed));
        metric!("duel_registry_matches_created_total", "Matches created", "counter",
            self.matches_created.load(Ordering::Relaxed));
        metric!("duel_registry_matches_joined_total", "Matches that reached READY", "counter",
            self.matches_joined.load(Ordering::Relaxed));
        metric!("duel_registry_matches_removed_total", "Matches removed", "counter",
            self.matches_removed.load(Ordering::Relaxed));
        metric!("duel_registry_position_updates_total", "Position updates applied", "counter",
            self.position_updates.load(Ordering::Relaxed));
        metric!("duel_registry_rejected_operations_total", "Operations rejected by the registry", "counter",
            self.rejected_operations.load(Ordering::Relaxed));
        metric!("duel_registry_uptime_seconds", "Uptime in seconds", "counter",
            self.uptime_seconds());

        output
    }

    /// Generate JSON format metrics
    pub fn to_json(&self, gauges: RegistryGauges) -> String {
        serde_json::json!({
            "registry": {
                "players": gauges.players,
                "matches_waiting": gauges.matches_waiting,
                "matches_ready": gauges.matches_ready,
            },
            "counters": {
                "players_connected": self.players_connected.load(Ordering::Relaxed),
                "players_disconnected": self.players_disconnected.load(Ordering::Relaxed),
                "matches_created": self.matches_created.load(Ordering::Relaxed),
                "matches_joined": self.matches_joined.load(Ordering::Relaxed),
                "matches_removed": self.matches_removed.load(Ordering::Relaxed),
                "position_updates": self.position_updates.load(Ordering::Relaxed),
                "rejected_operations": self.rejected_operations.load(Ordering::Relaxed),
            },
            "uptime_seconds": self.uptime_seconds(),
        })
        .to_string()
    }
}

impl Default for RegistryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the HTTP response for one admin request line
pub fn admin_response(registry: &Registry, request: &str) -> String {
    let metrics = registry.metrics();

    let (status, content_type, body) = if request.starts_with("GET /metrics/json") {
        ("200 OK", "application/json", metrics.to_json(registry.gauges()))
    } else if request.starts_with("GET /metrics") {
        ("200 OK", "text/plain; version=0.0.4", metrics.to_prometheus(registry.gauges()))
    } else if request.starts_with("GET /matches") {
        match serde_json::to_string(&registry.get_match_data_for_table()) {
            Ok(body) => ("200 OK", "application/json", body),
            Err(e) => ("500 Internal Server Error", "text/plain", e.to_string()),
        }
    } else if request.starts_with("GET /health") || request.starts_with("GET / ") {
        ("200 OK", "text/plain", "OK".to_string())
    } else {
        return "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string();
    };

    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

#[cfg(feature = "admin")]
pub use admin::start_admin_server;

#[cfg(feature = "admin")]
mod admin {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tracing::{debug, info};

    use super::admin_response;
    use crate::registry::manager::Registry;

    /// Start the admin HTTP server
    pub async fn start_admin_server(registry: Arc<Registry>, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        serve(listener, registry).await
    }

    pub(crate) async fn serve(listener: TcpListener, registry: Arc<Registry>) -> anyhow::Result<()> {
        info!("Admin server listening on http://{}/metrics", listener.local_addr()?);

        loop {
            let (mut socket, peer) = listener.accept().await?;
            let registry = registry.clone();

            tokio::spawn(async move {
                let mut buffer = [0u8; 1024];

                match socket.read(&mut buffer).await {
                    Ok(n) if n > 0 => {
                        let request = String::from_utf8_lossy(&buffer[..n]);
                        let response = admin_response(&registry, &request);

                        if let Err(e) = socket.write_all(response.as_bytes()).await {
                            debug!("Failed to write admin response to {}: {}", peer, e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Failed to read from admin socket {}: {}", peer, e);
                    }
                }
            });
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::net::IpAddr;

        #[tokio::test]
        async fn test_serves_match_table() {
            let registry = Arc::new(Registry::default());
            let addr: IpAddr = "1.1.1.1".parse().unwrap();
            registry.create_player("A", addr).unwrap();
            registry.create_match("A").unwrap();

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let local = listener.local_addr().unwrap();
            tokio::spawn(serve(listener, registry.clone()));

            let mut stream = tokio::net::TcpStream::connect(local).await.unwrap();
            stream.write_all(b"GET /matches HTTP/1.1\r\n\r\n").await.unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).await.unwrap();

            assert!(response.starts_with("HTTP/1.1 200 OK"));
            assert!(response.contains("\"enemy\":\"Waiting for player\""));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn registry_with_match() -> Registry {
        let registry = Registry::default();
        let addr: IpAddr = "1.1.1.1".parse().unwrap();
        registry.create_player("A", addr).unwrap();
        registry.create_player("B", addr).unwrap();
        let match_id = registry.create_match("A").unwrap();
        registry.join_match(match_id, "B").unwrap();
        registry
    }

    #[test]
    fn test_metrics_new() {
        let metrics = RegistryMetrics::new();
        assert_eq!(metrics.players_connected.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.rejected_operations.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_prometheus_format() {
        let registry = registry_with_match();

        let output = registry.metrics().to_prometheus(registry.gauges());

        assert!(output.contains("duel_registry_players 2"));
        assert!(output.contains("duel_registry_matches_ready 1"));
        assert!(output.contains("duel_registry_matches_created_total 1"));
        assert!(output.contains("duel_registry_matches_joined_total 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_json_format() {
        let registry = registry_with_match();

        let output = registry.metrics().to_json(registry.gauges());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["registry"]["players"], 2);
        assert_eq!(parsed["counters"]["players_connected"], 2);
    }

    #[test]
    fn test_admin_routes() {
        let registry = registry_with_match();

        let metrics = admin_response(&registry, "GET /metrics HTTP/1.1\r\n");
        assert!(metrics.starts_with("HTTP/1.1 200 OK"));
        assert!(metrics.contains("text/plain; version=0.0.4"));

        let json = admin_response(&registry, "GET /metrics/json HTTP/1.1\r\n");
        assert!(json.contains("application/json"));
        assert!(json.contains("\"counters\""));

        let table = admin_response(&registry, "GET /matches HTTP/1.1\r\n");
        assert!(table.contains("\"state\":\"READY\""));

        let health = admin_response(&registry, "GET /health HTTP/1.1\r\n");
        assert!(health.ends_with("OK"));

        let missing = admin_response(&registry, "POST /matches HTTP/1.1\r\n");
        assert!(missing.starts_with("HTTP/1.1 404"));
    }
}
