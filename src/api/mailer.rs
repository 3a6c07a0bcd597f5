// ==========================================
// 学习成果评估系统 - 密码重置邮件投递
// ==========================================
// 职责: 将新密码投递给用户（外部协作方）
// 红线: 日志中不得出现密码明文
// ==========================================

use async_trait::async_trait;

// ==========================================
// PasswordResetMailer Trait
// ==========================================
#[async_trait]
pub trait PasswordResetMailer: Send + Sync {
    /// 投递新密码
    ///
    /// # 参数
    /// - `email`: 收件人
    /// - `new_password`: 新密码明文
    async fn send_new_password(&self, email: &str, new_password: &str) -> anyhow::Result<()>;
}

/// 只记录投递动作的默认实现
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl PasswordResetMailer for LogMailer {
    async fn send_new_password(&self, email: &str, _new_password: &str) -> anyhow::Result<()> {
        tracing::info!(recipient = %email, "新密码邮件已投递 (Nueva Contraseña Software RA)");
        Ok(())
    }
}
