// ==========================================
// 销售询价跟踪系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;

/// 动态字段名最大长度默认值
pub const DEFAULT_MAX_FIELD_NAME_LENGTH: usize = 50;

/// 缺少销售代表时的默认名称
pub const DEFAULT_SALES_REP: &str = "Default Sales Rep";

/// 表头所在行（0 起算）默认值
pub const DEFAULT_HEADER_ROW_INDEX: usize = 0;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader: Send + Sync {
    /// 动态字段名截断长度
    ///
    /// # 默认值
    /// - 50
    fn max_field_name_length(&self) -> RepositoryResult<usize>;

    /// 表格未给出销售代表时写入的名称
    ///
    /// # 默认值
    /// - "Default Sales Rep"
    fn default_sales_rep(&self) -> RepositoryResult<String>;

    /// 文件导入时表头所在行（0 起算，之前的行视为分组表头丢弃）
    ///
    /// # 默认值
    /// - 0
    fn header_row_index(&self) -> RepositoryResult<usize>;
}
