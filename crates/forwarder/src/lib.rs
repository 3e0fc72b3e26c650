pub mod card;
pub mod cli;
pub mod demo;
pub mod feed;
pub mod forwarder;
pub mod poller;
pub mod schedule;
