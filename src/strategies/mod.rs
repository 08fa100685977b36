pub mod trailing_stop;
