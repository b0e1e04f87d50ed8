// ==========================================
// 销售询价跟踪系统 - 命令行入口
// ==========================================
// 用法:
//   enquiry-tracker <db> import <file> [--privileged] [--key <column>] [--user <name>]
//   enquiry-tracker <db> fields [--all]
//   enquiry-tracker <db> columns
//   enquiry-tracker <db> delete-field <name> [--force]
//   enquiry-tracker <db> system-fields
//   enquiry-tracker <db> list [--status <Open|Closed>] [--search <text>]
// 输出: stdout 为 JSON，日志写入 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use enquiry_tracker::app::{get_default_db_path, AppState};
use enquiry_tracker::domain::{EnquiryFilter, EnquiryStatus, ImportOptions};
use serde::Serialize;

const USAGE: &str = "用法: enquiry-tracker <db|-> <import|fields|columns|delete-field|system-fields|list> [参数]";

/// 简单的参数游标
struct Args {
    items: Vec<String>,
}

impl Args {
    fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    /// 取出布尔开关
    fn flag(&mut self, name: &str) -> bool {
        match self.items.iter().position(|a| a == name) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    /// 取出带值选项
    fn option(&mut self, name: &str) -> Result<Option<String>> {
        let Some(idx) = self.items.iter().position(|a| a == name) else {
            return Ok(None);
        };
        if idx + 1 >= self.items.len() {
            bail!("{} 需要一个参数值", name);
        }
        let value = self.items.remove(idx + 1);
        self.items.remove(idx);
        Ok(Some(value))
    }

    /// 取出下一个位置参数
    fn positional(&mut self, what: &str) -> Result<String> {
        if self.items.is_empty() {
            bail!("缺少参数 <{}>\n{}", what, USAGE);
        }
        Ok(self.items.remove(0))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    enquiry_tracker::logging::init();

    let mut args = Args::new(std::env::args().skip(1).collect());
    let db_path = match args.positional("db")?.as_str() {
        "-" => get_default_db_path(),
        path => path.to_string(),
    };
    let command = args.positional("command")?;

    tracing::info!(
        version = enquiry_tracker::VERSION,
        db_path = %db_path,
        command = %command,
        "{}",
        enquiry_tracker::APP_NAME
    );
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "import" => {
            let privileged = args.flag("--privileged");
            let key = args.option("--key")?;
            let user = args.option("--user")?;
            let file = args.positional("file")?;

            let mut options = ImportOptions {
                privileged,
                ..Default::default()
            };
            if let Some(key) = key {
                options = options.with_natural_key(key);
            }
            if let Some(user) = user {
                options = options.with_requested_by(user);
            }

            let result = state
                .import_api
                .import_file(&file, options)
                .await
                .with_context(|| format!("导入文件失败: {}", file))?;
            print_json(&result)?;
        }
        "fields" => {
            let include_inactive = args.flag("--all");
            print_json(&state.field_api.list_fields(include_inactive)?)?;
        }
        "columns" => print_json(&state.field_api.list_columns()?)?,
        "delete-field" => {
            let force = args.flag("--force");
            let name = args.positional("name")?;
            print_json(&state.field_api.delete_field(&name, force)?)?;
        }
        "system-fields" => print_json(&state.field_api.list_system_fields()?)?,
        "list" => {
            let status = args
                .option("--status")?
                .map(|s| s.parse::<EnquiryStatus>())
                .transpose()?;
            let filter = EnquiryFilter {
                status,
                search: args.option("--search")?,
                ..Default::default()
            };
            print_json(&state.enquiry_api.list_enquiries(&filter)?)?;
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
