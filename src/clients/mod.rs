//! 外部协作方
//!
//! 加载、保存、下发、交卷都是不透明的请求/响应，引擎只依赖这里的 trait。

pub mod file_store;
pub mod http_client;

pub use file_store::FileTestStore;
pub use http_client::HttpTestApi;

use crate::models::test_bundle::{
    Response, SavedTest, SubmitReceipt, TestDetail, TestForEdit, TestPayload,
};
use anyhow::Result;
use std::future::Future;

/// 试卷后端接口
pub trait TestApi {
    /// 获取编辑用的试卷数据
    fn get_test_for_edit(&self, test_id: i64) -> impl Future<Output = Result<TestForEdit>> + Send;

    /// 创建试卷
    fn create_test(&self, payload: &TestPayload) -> impl Future<Output = Result<SavedTest>> + Send;

    /// 更新试卷
    fn update_test(
        &self,
        test_id: i64,
        payload: &TestPayload,
    ) -> impl Future<Output = Result<SavedTest>> + Send;

    /// 获取作答用的试卷数据
    fn get_test_detail(&self, test_id: i64) -> impl Future<Output = Result<TestDetail>> + Send;

    /// 交卷
    fn submit_test(
        &self,
        test_id: i64,
        responses: &[Response],
    ) -> impl Future<Output = Result<SubmitReceipt>> + Send;
}
