/// Ceph broker 协议
///
/// charm 通过 ceph relation 的 `broker_req` 键发送声明式请求，
/// broker 异步地在 `broker_rsp`（或按请求方单元区分的键）中回写响应

pub mod message;
pub mod request;

pub use message::{BrokerOp, BrokerRequest, BrokerResponse};
pub use request::build_request;
