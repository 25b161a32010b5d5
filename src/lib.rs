extern crate num_iter;
#[macro_use] extern crate failure;
extern crate byteorder;
#[macro_use] extern crate serde_derive;
extern crate serde;
extern crate config;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate arrayref;
#[macro_use] extern crate log;
extern crate rayon;
extern crate shabal;
extern crate libc;

pub mod plot;
pub mod util;
