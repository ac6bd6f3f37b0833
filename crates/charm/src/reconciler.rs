/// Broker 请求/响应协调
///
/// 每次 hook 执行时根据 relation 上可见的数据判断请求状态：
/// 1. 当前单元发布的 `broker_req` 与期望请求等价（操作列表相同），视为已发送，沿用其请求ID
/// 2. 未发送时写入期望请求
/// 3. 已发送时查看远端单元的响应，只有请求ID匹配的响应才有效
///
/// 判断完全基于 relation 数据，进程重启后结果不变，重复调用不会重复发送。

use common::models::constants::{BROKER_REQ_KEY, BROKER_RSP_KEY, CEPH_ENDPOINT};
use common::utils::unit_key;
use common::{BrokerRequest, BrokerResponse, Result};
use tracing::{debug, info, warn};

use crate::hookenv::{HookTools, RelationData};

/// 请求状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// 尚未发送等价请求
    NoRequestSent,
    /// 已发送，等待响应
    Pending,
    /// broker 处理成功
    Fulfilled,
    /// broker 处理失败
    Failed { exit_code: i64, exit_msg: String },
}

impl RequestState {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled)
    }
}

/// Broker 协调器
pub struct BrokerReconciler<'a> {
    tools: &'a dyn HookTools,
    endpoint: &'a str,
}

impl<'a> BrokerReconciler<'a> {
    pub fn new(tools: &'a dyn HookTools) -> Self {
        Self {
            tools,
            endpoint: CEPH_ENDPOINT,
        }
    }

    /// 远端回写给当前单元的响应键
    fn unit_response_key(&self) -> String {
        format!("broker-rsp-{}", unit_key(self.tools.local_unit()))
    }

    /// 查询请求状态，不产生副作用
    pub async fn status(&self, desired: &BrokerRequest) -> Result<RequestState> {
        let mut states = Vec::new();
        for rid in self.tools.relation_ids(self.endpoint).await? {
            states.push(self.relation_status(&rid, desired).await?);
        }
        Ok(aggregate(states))
    }

    /// 查询请求状态，未发送时发送期望请求
    pub async fn reconcile(&self, desired: &BrokerRequest) -> Result<RequestState> {
        let mut states = Vec::new();
        for rid in self.tools.relation_ids(self.endpoint).await? {
            let state = match self.relation_status(&rid, desired).await? {
                RequestState::NoRequestSent => {
                    self.send(&rid, desired).await?;
                    RequestState::Pending
                }
                state => state,
            };
            states.push(state);
        }
        Ok(aggregate(states))
    }

    /// 单个 relation 上的请求状态
    async fn relation_status(&self, rid: &str, desired: &BrokerRequest) -> Result<RequestState> {
        let request_id = match self.sent_request_id(rid, desired).await? {
            Some(id) => id,
            None => return Ok(RequestState::NoRequestSent),
        };

        let mut failure = None;
        for unit in self.tools.related_units(rid).await? {
            let data = self.tools.relation_get(rid, &unit).await?;
            let response = match self.parse_response(&data, &unit) {
                Some(response) => response,
                None => continue,
            };

            if !response.answers(&request_id) {
                debug!(
                    "忽略过期的 broker 响应: relation={}, unit={}, request_id={:?}",
                    rid, unit, response.request_id
                );
                continue;
            }

            if response.is_success() {
                info!("broker 请求已完成: relation={}, request_id={}", rid, request_id);
                return Ok(RequestState::Fulfilled);
            }

            failure = Some(RequestState::Failed {
                exit_code: response.exit_code,
                exit_msg: response.exit_msg.unwrap_or_default(),
            });
        }

        Ok(failure.unwrap_or(RequestState::Pending))
    }

    /// 当前单元已发布的等价请求的ID
    async fn sent_request_id(&self, rid: &str, desired: &BrokerRequest) -> Result<Option<String>> {
        let local = self.tools.relation_get(rid, self.tools.local_unit()).await?;
        let raw = match local.get(BROKER_REQ_KEY) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };

        match BrokerRequest::from_json(raw) {
            Ok(sent) if sent.is_equivalent(desired) => Ok(Some(sent.request_id)),
            Ok(_) => {
                debug!("relation {} 上已发送的请求与期望不一致", rid);
                Ok(None)
            }
            Err(e) => {
                warn!("relation {} 上已发送的请求无法解析: {}", rid, e);
                Ok(None)
            }
        }
    }

    /// 读取远端单元的响应，优先使用按单元区分的键
    fn parse_response(&self, data: &RelationData, unit: &str) -> Option<BrokerResponse> {
        let raw = data
            .get(&self.unit_response_key())
            .or_else(|| data.get(BROKER_RSP_KEY))
            .filter(|raw| !raw.is_empty())?;

        match BrokerResponse::from_json(raw) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("单元 {} 的 broker 响应无法解析: {}", unit, e);
                None
            }
        }
    }

    /// 发布请求
    async fn send(&self, rid: &str, request: &BrokerRequest) -> Result<()> {
        info!(
            "发送 broker 请求: relation={}, request_id={}, ops={}",
            rid,
            request.request_id,
            request.ops.len()
        );
        let settings = RelationData::from([(BROKER_REQ_KEY.to_string(), request.to_json()?)]);
        self.tools.relation_set(rid, &settings).await
    }
}

/// 合并各 relation 上的状态
///
/// 全部完成才算完成；任一失败即失败；没有 relation 时视为未发送。
fn aggregate(states: Vec<RequestState>) -> RequestState {
    if states.is_empty() {
        return RequestState::NoRequestSent;
    }
    if states.iter().all(RequestState::is_fulfilled) {
        return RequestState::Fulfilled;
    }
    if let Some(failed) = states
        .iter()
        .find(|s| matches!(s, RequestState::Failed { .. }))
    {
        return failed.clone();
    }
    if states.contains(&RequestState::NoRequestSent) {
        return RequestState::NoRequestSent;
    }
    RequestState::Pending
}
