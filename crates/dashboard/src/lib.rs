#![doc = include_str!("../README.md")]
//!
//! # 요청 흐름
//!
//! ```text
//! GET /data -> spawn_blocking { Dataset::snapshot() -> Snapshot::to_table()
//!                               -> QuerySpec::run() -> ChartRenderer } -> JSON
//! ```

pub mod chart;
pub mod error;
pub mod html;
pub mod query;
pub mod server;
pub mod view;
pub mod width;

// --- 주요 타입 re-export ---

// 에러
pub use error::{DashboardError, QueryError, WidthError};

// 쿼리
pub use query::{Filter, QuerySpec};
pub use width::TimeWidth;

// 뷰
pub use view::{ContextResponse, DataResponse, Dashboards, Layout};

// 서버
pub use server::{DashboardState, bind, router, serve};
