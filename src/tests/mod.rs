
mod dex_parse;
