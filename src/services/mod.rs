//! 业务逻辑服务模块
//!
//! 数据获取、实时会话、各区块的视图投影和看板编排

pub mod market_api;      // 分析服务客户端
pub mod baseline;        // 业绩基准表
pub mod live;            // 实时会话状态
pub mod poller;          // 实时价格轮询
pub mod format;          // 展示格式化
pub mod performance;     // 业绩条
pub mod chart;           // 图表状态与投影
pub mod recommendation;  // 市场扫描推荐
pub mod overview;        // 静态概览
pub mod dashboard;       // 看板编排

#[cfg(test)]
pub mod testing;
