//! 存活探测处理器
//!
//! 没有接入业务路由时使用：`GET /` 返回欢迎文本，`GET /health` 返回健康状态

use rat_logger::debug;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use super::handler::{HealthStatus, RequestContext, RequestHandler};
use crate::error::TakeawayResult;

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_HEADER_LINES: usize = 100;

/// 最小化的 HTTP/1.1 探测处理器，每个连接只处理一个请求
#[derive(Debug, Clone)]
pub struct ProbeHandler {
    banner: String,
}

impl ProbeHandler {
    pub fn new<S: Into<String>>(banner: S) -> Self {
        Self {
            banner: banner.into(),
        }
    }

    fn respond(&self, method: &str, path: &str, health: HealthStatus) -> (u16, &'static str, String) {
        match (method, path) {
            ("GET", "/") => (200, "OK", self.banner.clone()),
            ("GET", "/health") => match health {
                HealthStatus::Ok => (200, "OK", health.as_str().to_string()),
                HealthStatus::ShuttingDown => {
                    (503, "Service Unavailable", health.as_str().to_string())
                }
            },
            _ => (404, "Not Found", "Not Found".to_string()),
        }
    }
}

impl RequestHandler for ProbeHandler {
    fn handle(&self, stream: TcpStream, context: &RequestContext) -> TakeawayResult<()> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let mut reader = BufReader::new(stream.try_clone()?);

        let mut request_line = String::new();
        if reader.read_line(&mut request_line)? == 0 {
            return Ok(());
        }
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        // 丢弃请求头
        let mut line = String::new();
        for _ in 0..MAX_HEADER_LINES {
            line.clear();
            if reader.read_line(&mut line)? == 0 || line.trim_end().is_empty() {
                break;
            }
        }

        let (status, reason, body) = self.respond(&method, &path, context.health());
        debug!("探测请求: {} {} -> {}", method, path, status);

        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes())?;
        stream.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        let probe = ProbeHandler::new("TakeAwayPlatform is running!");

        let (status, _, body) = probe.respond("GET", "/", HealthStatus::Ok);
        assert_eq!(status, 200);
        assert_eq!(body, "TakeAwayPlatform is running!");

        let (status, _, body) = probe.respond("GET", "/health", HealthStatus::ShuttingDown);
        assert_eq!(status, 503);
        assert_eq!(body, "SHUTTING_DOWN");

        let (status, _, _) = probe.respond("POST", "/health", HealthStatus::Ok);
        assert_eq!(status, 404);
    }
}
