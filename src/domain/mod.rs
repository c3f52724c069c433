// 領域層：核心模型與 ports，不含 HTTP 或檔案系統程式碼

pub mod model;
pub mod ports;
