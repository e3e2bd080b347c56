//! 服务层模块
//!
//! 包含核心业务逻辑：执行、渲染、落盘、git 发布与结果汇总

pub mod executor;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod reporter;
pub mod site;

pub use executor::Executor;
pub use pipeline::{DeployPipeline, PipelineError, ValidationError};
pub use publish::PublishOrchestrator;
pub use site::SiteMaterializer;
