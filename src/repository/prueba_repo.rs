// ==========================================
// 学习成果评估系统 - 测评 Repository Trait
// ==========================================
// 职责: 以聚合为单位加载/保存测评（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 红线: save 是整聚合替换, 不做字段级合并
// ==========================================

use crate::domain::assessment::Assessment;
use crate::repository::error::RepositoryResult;

// ==========================================
// AssessmentRepository Trait
// ==========================================
// 用途: 测评聚合的数据访问
// 实现者: AssessmentRepositoryImpl（使用 rusqlite + JSON 文档）
pub trait AssessmentRepository: Send + Sync {
    /// 查询全部测评（按创建时间升序）
    fn find_all(&self) -> RepositoryResult<Vec<Assessment>>;

    /// 按ID查询
    ///
    /// # 返回
    /// - Ok(Some(Assessment)): 找到
    /// - Ok(None): 未找到
    fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Assessment>>;

    /// 新建测评
    fn create(&self, assessment: &Assessment) -> RepositoryResult<()>;

    /// 整聚合替换
    ///
    /// # 返回
    /// - Err(RepositoryError::NotFound): 测评不存在
    fn save(&self, assessment: &Assessment) -> RepositoryResult<()>;

    /// 删除测评
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 测评不存在
    fn delete_by_id(&self, id: &str) -> RepositoryResult<bool>;
}
