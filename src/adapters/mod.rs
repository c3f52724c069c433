// 轉接層：domain ports 的實作 (模型服務、儲存)

pub mod gemini;
pub mod storage;
