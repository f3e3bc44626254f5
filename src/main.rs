// ==========================================
// DAT 导入 - 定时任务入口
// ==========================================
// 用法:
//   dat-import [source_dir] [db_path]
// 其余配置见 DAT_IMPORT_* 环境变量
// 同一时刻只允许运行一个实例（由外部调度器保证）
// ==========================================

use anyhow::Context;
use dat_import::{logging, ImportJob, ImportJobConfig, JobOutcome};

fn main() -> anyhow::Result<()> {
    let config = ImportJobConfig::from_env().apply_args(std::env::args().skip(1));
    config.validate().context("配置无效")?;

    match &config.log_file {
        Some(path) => logging::init_with_file(path)
            .with_context(|| format!("无法打开日志文件: {}", path.display()))?,
        None => logging::init(),
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", dat_import::APP_NAME, dat_import::VERSION);
    tracing::info!("监控目录: {}", config.source_dir.display());
    tracing::info!("数据库: {}", config.db_path);
    tracing::info!("==================================================");

    let job = ImportJob::new(config);
    let outcome = job.run().context("DAT 导入失败")?;

    match outcome {
        JobOutcome::NoFiles => println!("没有找到 .{} 文件", job.config().file_extension),
        JobOutcome::AlreadyImported { file_name } => println!("{} 已导入", file_name),
        JobOutcome::Imported { file_name, outcome } => {
            println!(
                "已导入 {}。导入: {}, 跳过: {}, 错误: {}",
                file_name,
                outcome.imported_count,
                outcome.skipped_count,
                outcome.error_count()
            );
            if !outcome.errors.is_empty() {
                println!("错误:");
                for err in &outcome.errors {
                    println!("{}", err);
                }
            }
        }
        JobOutcome::Aborted { file_name, outcome } => {
            eprintln!("{} 读取失败，未写入台账", file_name);
            for err in &outcome.errors {
                eprintln!("{}", err);
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
