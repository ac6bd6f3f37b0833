/// 内存中的 hook 环境，供测试使用

use async_trait::async_trait;
use common::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{HookTools, RelationData};

#[derive(Default)]
struct Relation {
    endpoint: String,
    /// 单元名 -> 数据，包含当前单元自己的数据
    units: BTreeMap<String, RelationData>,
}

#[derive(Default)]
struct State {
    relations: BTreeMap<String, Relation>,
    config: serde_json::Value,
    leader_settings: RelationData,
    is_leader: bool,
    /// relation-set 调用记录
    relation_sets: Vec<(String, RelationData)>,
}

pub struct MemoryHookTools {
    local_unit: String,
    state: Mutex<State>,
}

impl MemoryHookTools {
    pub fn new(local_unit: impl Into<String>) -> Self {
        Self {
            local_unit: local_unit.into(),
            state: Mutex::new(State {
                config: serde_json::json!({}),
                ..Default::default()
            }),
        }
    }

    pub fn add_relation(&self, endpoint: &str, relation_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.relations.insert(
            relation_id.to_string(),
            Relation {
                endpoint: endpoint.to_string(),
                units: BTreeMap::new(),
            },
        );
    }

    pub fn remove_relation(&self, relation_id: &str) {
        self.state.lock().unwrap().relations.remove(relation_id);
    }

    /// 设置远端单元的数据
    pub fn set_remote(&self, relation_id: &str, unit: &str, key: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        let relation = state
            .relations
            .get_mut(relation_id)
            .expect("relation not added");
        relation
            .units
            .entry(unit.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// 读取当前单元在 relation 上发布的数据
    pub fn local_data(&self, relation_id: &str) -> RelationData {
        let state = self.state.lock().unwrap();
        state
            .relations
            .get(relation_id)
            .and_then(|r| r.units.get(&self.local_unit))
            .cloned()
            .unwrap_or_default()
    }

    /// 指定 relation 上 relation-set 的调用次数
    pub fn relation_set_count(&self, relation_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .relation_sets
            .iter()
            .filter(|(rid, _)| rid == relation_id)
            .count()
    }

    pub fn set_config(&self, config: serde_json::Value) {
        self.state.lock().unwrap().config = config;
    }

    pub fn set_leader(&self, is_leader: bool) {
        self.state.lock().unwrap().is_leader = is_leader;
    }

    pub fn set_leader_setting(&self, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .leader_settings
            .insert(key.to_string(), value.to_string());
    }

    pub fn leader_setting(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().leader_settings.get(key).cloned()
    }
}

#[async_trait]
impl HookTools for MemoryHookTools {
    fn local_unit(&self) -> &str {
        &self.local_unit
    }

    async fn relation_ids(&self, endpoint: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .relations
            .iter()
            .filter(|(_, r)| r.endpoint == endpoint)
            .map(|(rid, _)| rid.clone())
            .collect())
    }

    async fn related_units(&self, relation_id: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .relations
            .get(relation_id)
            .map(|r| {
                r.units
                    .keys()
                    .filter(|unit| **unit != self.local_unit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn relation_get(&self, relation_id: &str, unit: &str) -> Result<RelationData> {
        let state = self.state.lock().unwrap();
        Ok(state
            .relations
            .get(relation_id)
            .and_then(|r| r.units.get(unit))
            .cloned()
            .unwrap_or_default())
    }

    async fn relation_set(&self, relation_id: &str, settings: &RelationData) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let relation = state
            .relations
            .get_mut(relation_id)
            .ok_or_else(|| Error::NotFound(format!("relation {} 不存在", relation_id)))?;
        let data = relation.units.entry(self.local_unit.clone()).or_default();
        for (key, value) in settings {
            if value.is_empty() {
                data.remove(key);
            } else {
                data.insert(key.clone(), value.clone());
            }
        }
        state
            .relation_sets
            .push((relation_id.to_string(), settings.clone()));
        Ok(())
    }

    async fn config_get(&self) -> Result<serde_json::Value> {
        Ok(self.state.lock().unwrap().config.clone())
    }

    async fn leader_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.leader_setting(key))
    }

    async fn leader_set(&self, settings: &RelationData) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.is_leader {
            return Err(Error::HookTool("只有 leader 可以写入 leader 设置".to_string()));
        }
        for (key, value) in settings {
            state.leader_settings.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn is_leader(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().is_leader)
    }
}
