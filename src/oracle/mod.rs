pub mod coinbase;
