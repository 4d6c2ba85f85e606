//! 지리 정보 조회 -- 대상 판별, 캐시, 요청 제한 재시도
//!
//! 루프백, IPv6, 로컬 네트워크, 파싱 불가 주소는 조회하지 않습니다.
//! 조회 결과는 "데이터 없음"을 포함해 주소별로 프로세스 수명 동안 캐시됩니다.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use ipnet::IpNet;
use logalyzer_core::error::ResolveError;
use logalyzer_core::metrics as m;
use logalyzer_core::pipeline::{GeoInfo, GeoResolver};
use tracing::{debug, warn};

/// 요청 제한 시 최대 대기 시간
pub const MAX_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(5);

/// 지리 정보 조회기
pub struct GeoLookup {
    resolver: Box<dyn GeoResolver>,
    local_networks: Vec<IpNet>,
    cache: HashMap<IpAddr, Option<GeoInfo>>,
}

impl GeoLookup {
    pub fn new(resolver: Box<dyn GeoResolver>, local_networks: Vec<IpNet>) -> Self {
        Self {
            resolver,
            local_networks,
            cache: HashMap::new(),
        }
    }

    /// 주소가 지리 조회 대상인지 판별합니다.
    pub fn is_eligible(&self, ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V6(_) => false,
            IpAddr::V4(v4) if v4.is_loopback() => false,
            _ => !self.local_networks.iter().any(|net| net.contains(ip)),
        }
    }

    /// 원격 주소 문자열의 지리 정보를 조회합니다.
    ///
    /// 대상이 아니거나 정보가 없으면 `None`을 반환합니다. 에러는 전파하지 않습니다.
    pub fn resolve(&mut self, remote_ip: &str) -> Option<GeoInfo> {
        let ip: IpAddr = remote_ip.trim().parse().ok()?;
        if !self.is_eligible(&ip) {
            return None;
        }
        if let Some(cached) = self.cache.get(&ip) {
            return cached.clone();
        }

        match self.lookup_with_retry(ip) {
            Ok(info) => self.remember(ip, info),
            // 사용 불가는 정보 없음으로 캐시합니다
            Err(ResolveError::Unavailable(reason)) => {
                debug!(resolver = self.resolver.name(), %ip, %reason, "geo resolver unavailable");
                self.remember(ip, None)
            }
            Err(e) => {
                debug!(resolver = self.resolver.name(), %ip, error = %e, "geo lookup failed");
                None
            }
        }
    }

    fn remember(&mut self, ip: IpAddr, info: Option<GeoInfo>) -> Option<GeoInfo> {
        self.cache.insert(ip, info.clone());
        metrics::gauge!(m::LOG_PIPELINE_GEO_CACHE_SIZE).set(self.cache.len() as f64);
        info
    }

    fn lookup_with_retry(&self, ip: IpAddr) -> Result<Option<GeoInfo>, ResolveError> {
        match self.resolver.lookup(ip) {
            Err(ResolveError::RateLimited { retry_after }) => {
                let wait = retry_after.min(MAX_RATE_LIMIT_BACKOFF);
                warn!(
                    resolver = self.resolver.name(),
                    %ip,
                    wait_ms = wait.as_millis() as u64,
                    "geo resolver rate limited, retrying once"
                );
                std::thread::sleep(wait);
                self.resolver.lookup(ip)
            }
            other => other,
        }
    }

    /// 캐시된 주소 수
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
