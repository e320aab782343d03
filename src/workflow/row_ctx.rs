//! 行处理上下文
//!
//! 封装"我正在处理第几个文件"这一信息

use std::fmt::Display;

/// 行处理上下文（仅用于日志和进度显示）
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 当前序号（从 1 开始）
    pub position: usize,
    /// 本轮总数
    pub total: usize,
    /// 文件名
    pub file_name: String,
}

impl RowCtx {
    pub fn new(position: usize, total: usize, file_name: impl Into<String>) -> Self {
        Self {
            position,
            total,
            file_name: file_name.into(),
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 {}/{}]", self.position, self.total)
    }
}
