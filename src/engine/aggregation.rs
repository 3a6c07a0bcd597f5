// ==========================================
// 学习成果评估系统 - 成绩汇总引擎
// ==========================================
// 三级平均:
//   1) 组内单个学习成果平均 (average_for_outcome_in_group)
//   2) 组平均 (average_for_group)
//   3) 测评平均 (average_for_assessment)
// ==========================================
// 红线: 零个成绩的平均值为 0（不是 NaN, 不是错误）
// 红线: 重算是纯函数, 缓存全量覆盖, 不做合并
// ==========================================

use crate::domain::assessment::{Assessment, Grade, Group, OutcomeAverage};
use tracing::instrument;

// ==========================================
// AggregationEngine - 成绩汇总引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct AggregationEngine;

impl AggregationEngine {
    /// 创建新的汇总引擎
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 三级平均计算
    // ==========================================

    /// 组内某学习成果的平均分
    ///
    /// 无成绩的学生不贡献任何成绩；无匹配成绩时返回 0
    pub fn average_for_outcome_in_group(&self, group: &Group, outcome_id: &str) -> f64 {
        mean(group.grades().filter(|g| g.outcome_id == outcome_id))
    }

    /// 组内所有成绩的平均分（不按学习成果过滤）
    pub fn average_for_group(&self, group: &Group) -> f64 {
        mean(group.grades())
    }

    /// 测评内所有成绩的平均分（跨所有分组）
    pub fn average_for_assessment(&self, assessment: &Assessment) -> f64 {
        mean(assessment.grades())
    }

    // ==========================================
    // 缓存重算
    // ==========================================

    /// 重算测评的全部缓存平均值
    ///
    /// 顺序:
    /// 1. 每个分组按测评学习成果顺序写入 {outcome_id, average}
    /// 2. 每个分组写入组平均
    /// 3. 写入测评平均
    ///
    /// # 返回
    /// - `true`: 缓存值发生变化（调用方据此决定是否落库）
    /// - `false`: 与重算前一致
    #[instrument(skip(self, assessment), fields(assessment_id = %assessment.id, groups = assessment.groups.len()))]
    pub fn recompute_assessment(&self, assessment: &mut Assessment) -> bool {
        let mut changed = false;

        for group in assessment.groups.iter_mut() {
            let outcome_averages: Vec<OutcomeAverage> = assessment
                .outcome_ids
                .iter()
                .map(|outcome_id| OutcomeAverage {
                    outcome_id: outcome_id.clone(),
                    average: self.average_for_outcome_in_group(group, outcome_id),
                })
                .collect();
            let group_average = self.average_for_group(group);

            if group.outcome_averages != outcome_averages || group.average != group_average {
                changed = true;
            }
            group.outcome_averages = outcome_averages;
            group.average = group_average;
        }

        let assessment_average = self.average_for_assessment(assessment);
        if assessment.average != assessment_average {
            changed = true;
        }
        assessment.average = assessment_average;

        tracing::debug!(average = assessment.average, changed, "测评平均值重算完成");
        changed
    }
}

/// 算术平均, 空集合返回 0
fn mean<'a, I>(grades: I) -> f64
where
    I: IntoIterator<Item = &'a Grade>,
{
    let (total, count) = grades
        .into_iter()
        .fold((0.0_f64, 0_usize), |(total, count), g| (total + g.score, count + 1));

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
