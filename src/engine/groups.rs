// ==========================================
// 学习成果评估系统 - 分组规划
// ==========================================
// 职责: 根据分组数量与负责人列表生成空分组
// 规则: 第 i 组（从 0 开始）由第 i 个负责人负责, 名称 "Grupo {i+1}"
// 红线: 负责人数量少于分组数量时拒绝
// ==========================================

use crate::domain::assessment::Group;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// GroupPlanner - 分组规划器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupPlanner;

impl GroupPlanner {
    pub fn new() -> Self {
        Self
    }

    /// 校验分组参数, 返回每组对应的负责人ID
    ///
    /// 多余的负责人ID被忽略
    pub fn plan(&self, group_count: usize, responsible_ids: &[String]) -> EngineResult<Vec<String>> {
        if group_count == 0 {
            return Err(EngineError::Validation(
                "La cantidad de grupos debe ser al menos 1".to_string(),
            ));
        }
        if responsible_ids.len() < group_count {
            return Err(EngineError::Validation(format!(
                "Se requieren {} usuarios responsables y se recibieron {}",
                group_count,
                responsible_ids.len()
            )));
        }

        let planned: Vec<String> = responsible_ids
            .iter()
            .take(group_count)
            .map(|id| id.trim().to_string())
            .collect();
        if planned.iter().any(|id| id.is_empty()) {
            return Err(EngineError::Validation(
                "Los usuarios responsables no pueden estar vacíos".to_string(),
            ));
        }
        Ok(planned)
    }

    /// 生成空分组
    pub fn build_groups(&self, responsible_ids: &[String]) -> Vec<Group> {
        responsible_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| Group::new(idx, id.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_groups_named_and_assigned_in_order() {
        let planner = GroupPlanner::new();
        let planned = planner.plan(2, &ids(&["U1", "U2", "U3"])).unwrap();
        let groups = planner.build_groups(&planned);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Grupo 1");
        assert_eq!(groups[0].responsible_id, "U1");
        assert_eq!(groups[1].name, "Grupo 2");
        assert_eq!(groups[1].responsible_id, "U2");
        assert_ne!(groups[0].id, groups[1].id);
        assert!(groups.iter().all(|g| g.students.is_empty() && g.average == 0.0));
    }

    #[test]
    fn test_plan_rejects_invalid_counts() {
        let planner = GroupPlanner::new();
        assert!(planner.plan(0, &ids(&["U1"])).is_err());
        assert!(planner.plan(3, &ids(&["U1", "U2"])).is_err());
        assert!(planner.plan(2, &ids(&["U1", " "])).is_err());
    }
}
