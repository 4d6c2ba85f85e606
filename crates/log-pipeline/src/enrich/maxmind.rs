//! MaxMind GeoIP2/GeoLite2 리졸버
//!
//! City DB와 ASN DB를 각각 선택적으로 엽니다. 열 수 없는 DB는 에러 로그를
//! 남기고 없는 것으로 취급합니다.

use std::net::IpAddr;
use std::path::Path;

use logalyzer_core::error::ResolveError;
use logalyzer_core::pipeline::{GeoInfo, GeoResolver};
use maxminddb::{PathElement, Reader};
use tracing::{error, info};

type DbReader = Reader<Vec<u8>>;

/// MaxMind DB 기반 [`GeoResolver`]
pub struct MaxMindResolver {
    city_reader: Option<DbReader>,
    asn_reader: Option<DbReader>,
}

impl MaxMindResolver {
    /// City / ASN DB 경로로 리졸버를 생성합니다. 둘 다 선택 사항입니다.
    pub fn open(city_db: Option<&Path>, asn_db: Option<&Path>) -> Self {
        Self {
            city_reader: city_db.and_then(|p| open_db(p, "city")),
            asn_reader: asn_db.and_then(|p| open_db(p, "asn")),
        }
    }

    /// 열린 DB가 하나라도 있는지 확인합니다.
    pub fn is_available(&self) -> bool {
        self.city_reader.is_some() || self.asn_reader.is_some()
    }
}

fn open_db(path: &Path, kind: &str) -> Option<DbReader> {
    match Reader::open_readfile(path) {
        Ok(reader) => {
            info!(path = %path.display(), kind, "geoip database opened");
            Some(reader)
        }
        Err(e) => {
            error!(path = %path.display(), kind, error = %e, "cannot open geoip database");
            None
        }
    }
}

impl GeoResolver for MaxMindResolver {
    fn name(&self) -> &str {
        "maxmind"
    }

    fn lookup(&self, ip: IpAddr) -> Result<Option<GeoInfo>, ResolveError> {
        if !self.is_available() {
            return Err(ResolveError::Unavailable("no geoip database loaded".to_owned()));
        }

        let mut geo = GeoInfo::default();
        let mut found = false;

        if let Some(reader) = &self.city_reader {
            let lookup = reader
                .lookup(ip)
                .map_err(|e| ResolveError::Lookup(e.to_string()))?;

            geo.city = lookup
                .decode_path::<String>(&[
                    PathElement::Key("city"),
                    PathElement::Key("names"),
                    PathElement::Key("en"),
                ])
                .ok()
                .flatten();
            geo.country = lookup
                .decode_path::<String>(&[
                    PathElement::Key("country"),
                    PathElement::Key("names"),
                    PathElement::Key("en"),
                ])
                .ok()
                .flatten();
            geo.lat = lookup
                .decode_path::<f64>(&[PathElement::Key("location"), PathElement::Key("latitude")])
                .ok()
                .flatten();
            geo.long = lookup
                .decode_path::<f64>(&[
                    PathElement::Key("location"),
                    PathElement::Key("longitude"),
                ])
                .ok()
                .flatten();
            found |= geo.city.is_some() || geo.country.is_some() || geo.lat.is_some();
        }

        if let Some(reader) = &self.asn_reader {
            let lookup = reader
                .lookup(ip)
                .map_err(|e| ResolveError::Lookup(e.to_string()))?;
            geo.asn = lookup
                .decode_path::<String>(&[PathElement::Key("autonomous_system_organization")])
                .ok()
                .flatten();
            found |= geo.asn.is_some();
        }

        Ok(found.then_some(geo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_databases_is_unavailable() {
        let resolver = MaxMindResolver::open(None, None);
        assert!(!resolver.is_available());
        assert!(matches!(
            resolver.lookup("8.8.8.8".parse().unwrap()),
            Err(ResolveError::Unavailable(_))
        ));
    }

    #[test]
    fn unreadable_database_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("city.mmdb");
        std::fs::write(&bogus, b"not a maxmind database").unwrap();

        let resolver = MaxMindResolver::open(Some(&bogus), Some(&dir.path().join("missing.mmdb")));
        assert!(!resolver.is_available());
    }
}
