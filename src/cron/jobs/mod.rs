pub mod poll_gas_price;
