/// Broker 请求/响应消息定义

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 当前 broker 协议版本
pub const BROKER_API_VERSION: u32 = 1;

/// Broker 操作
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum BrokerOp {
    /// 创建存储池
    CreatePool {
        name: String,
        replicas: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weight: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<String>,
    },

    /// 申请访问存储池组
    #[serde(rename_all = "kebab-case")]
    RequestAccessToGroup {
        name: String,
        #[serde(default)]
        object_prefix_permissions: BTreeMap<String, Vec<String>>,
        permission: String,
    },
}

/// Broker 请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrokerRequest {
    /// 协议版本
    pub api_version: u32,

    /// 请求唯一ID
    pub request_id: String,

    /// 有序操作列表
    pub ops: Vec<BrokerOp>,
}

impl BrokerRequest {
    /// 创建空请求，生成新的请求ID
    pub fn new() -> Self {
        Self {
            api_version: BROKER_API_VERSION,
            request_id: Uuid::new_v4().to_string(),
            ops: Vec::new(),
        }
    }

    /// 追加一个操作
    pub fn add_op(&mut self, op: BrokerOp) {
        self.ops.push(op);
    }

    /// 判断两个请求是否等价（只比较操作列表，忽略请求ID）
    pub fn is_equivalent(&self, other: &BrokerRequest) -> bool {
        self.ops == other.ops
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 从 JSON 字符串反序列化
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for BrokerRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Broker 响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BrokerResponse {
    /// 对应请求的ID（旧版本 broker 可能不回写）
    #[serde(default)]
    pub request_id: Option<String>,

    /// 退出码，0 表示成功
    pub exit_code: i64,

    /// 诊断信息
    #[serde(default)]
    pub exit_msg: Option<String>,
}

impl BrokerResponse {
    /// 从 JSON 字符串反序列化
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 判断是否是成功响应
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// 判断响应是否对应指定请求
    pub fn answers(&self, request_id: &str) -> bool {
        self.request_id.as_deref() == Some(request_id)
    }
}
