// ==========================================
// 销售询价跟踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{EnquiryApi, FieldApi, ImportApi};
use crate::config::config_manager::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::importer::{EnquiryImporter, EnquiryImporterImpl};
use crate::repository::{
    EnquiryRepository, FieldDefinitionRepository, RecordStore, SystemFieldRepository,
};
use crate::schema::{FieldRegistry, SystemFieldRegistry};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 字段管理API
    pub field_api: Arc<FieldApi>,

    /// 询价导入API
    pub import_api: Arc<ImportApi>,

    /// 询价查询API
    pub enquiry_api: Arc<EnquiryApi>,

    /// 配置管理器（导入参数覆写）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let enquiry_repo: Arc<dyn RecordStore> = Arc::new(
            EnquiryRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建EnquiryRepository: {}", e))?,
        );
        let field_definition_repo = Arc::new(
            FieldDefinitionRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建FieldDefinitionRepository: {}", e))?,
        );
        let system_field_repo = Arc::new(
            SystemFieldRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建SystemFieldRepository: {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化字段模式引擎
        // ==========================================
        let registry = Arc::new(FieldRegistry::new(field_definition_repo, enquiry_repo.clone()));
        let system_fields = Arc::new(SystemFieldRegistry::new(system_field_repo));
        if let Err(e) = system_fields.ensure_defaults() {
            tracing::warn!("默认系统字段初始化失败(将继续启动): {}", e);
        }

        // ==========================================
        // 初始化导入器
        // ==========================================
        let importer: Arc<dyn EnquiryImporter> = Arc::new(EnquiryImporterImpl::with_defaults(
            EnquiryRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建EnquiryRepository: {}", e))?,
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
            registry.clone(),
        ));

        // ==========================================
        // 创建API实例
        // ==========================================
        let field_api = Arc::new(FieldApi::new(registry, system_fields));
        let import_api = Arc::new(ImportApi::new(importer));
        let enquiry_api = Arc::new(EnquiryApi::new(enquiry_repo));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            field_api,
            import_api,
            enquiry_api,
            config_manager,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 ENQUIRY_TRACKER_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("ENQUIRY_TRACKER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./enquiry_tracker.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("enquiry-tracker");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("enquiry_tracker.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_wiring() {
        let file = NamedTempFile::new().unwrap();
        let state = AppState::new(file.path().to_string_lossy().to_string()).unwrap();

        let system_fields = state.field_api.list_system_fields().unwrap();
        assert!(system_fields.iter().any(|f| f.name == "enquiry_number"));
        assert!(state.field_api.list_fields(true).unwrap().is_empty());
        assert_eq!(state.enquiry_api.count_enquiries().unwrap(), 0);
    }
}
