pub mod shop;

pub use shop::ShopService;
