pub mod exchangerate_api;
pub mod exchangerates_api;
