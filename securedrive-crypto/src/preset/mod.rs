pub mod demo_keys;
