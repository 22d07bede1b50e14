use super::DEVICES_PATH;
use crate::client::KrmPesanClient;
use crate::error::Result;
use crate::transport::ApiResponse;

impl KrmPesanClient {
    /// Details of the device the credentials belong to.
    pub async fn get_device(&self) -> Result<ApiResponse> {
        self.get(DEVICES_PATH).await
    }
}
