//! OuterBox 外箱标签打印站
//!
//! # 架构概述
//!
//! - **配置** (`core`): JSON 站点配置, 字段映射
//! - **数据库** (`db`): SQLite 存储 (产品表、打印记录、设置)
//! - **打印** (`printing`): 序列号收集、箱号生成、打印会话
//! - **表格** (`data_transfer`): xlsx 导入/导出
//! - **工具** (`utils`): 日志
//!
//! # 模块结构
//!
//! ```text
//! box-station/src/
//! ├── core/           # 站点配置
//! ├── db/             # 连接池、迁移、repository
//! ├── printing/       # batch / box_number / session
//! ├── data_transfer/  # xlsx
//! └── utils/          # 日志
//! ```

pub mod core;
pub mod data_transfer;
pub mod db;
pub mod printing;
pub mod utils;

// Re-export 公共类型
pub use core::{ConfigError, StationConfig};
pub use data_transfer::TransferError;
pub use db::DbService;
pub use db::repository::{RepoError, RepoResult};
pub use printing::{
    BatchCollector, CollectorEvent, PrintOutcome, PrintRequest, PrintSessionError, PrintSettings,
    PrintStation, SerialBatch,
};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
