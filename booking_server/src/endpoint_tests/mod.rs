mod admin;
mod gateway;
mod helpers;
mod mocks;
mod refunds;
